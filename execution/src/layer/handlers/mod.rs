mod oracle;
mod player;
mod pool;
