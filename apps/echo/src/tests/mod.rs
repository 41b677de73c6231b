mod echo;
mod logger;
mod loopback;
