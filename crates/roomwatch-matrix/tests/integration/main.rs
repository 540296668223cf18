mod support;

mod dispatch;
mod projection;
