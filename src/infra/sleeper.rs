use crate::app::ports::SleepPort;
use std::time::Duration;

pub struct ThreadSleeper;

impl SleepPort for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
