//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in heptaclock-core:
//!
//! - Servo output (dual PCA9685 PWM bank over async I2C)

#![no_std]
#![deny(unsafe_code)]

pub mod servo;
