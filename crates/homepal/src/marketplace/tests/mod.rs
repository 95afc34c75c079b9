mod common;
mod notifications;
mod quotes;
