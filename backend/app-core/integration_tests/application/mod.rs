mod lifecycle;
mod shutdown;
