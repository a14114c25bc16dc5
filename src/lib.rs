pub mod clock;
pub mod config;
pub mod motor;
pub mod pigpio;
pub mod pwm;
pub mod runtime;
pub mod session;
