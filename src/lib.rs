// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

#![doc = include_str!("../README.md")]
#![no_std]

#[cfg(feature = "std")]
extern crate std;

mod codec;
mod error;
mod frame;

pub mod dispatch;
#[cfg(feature = "std")]
pub mod session;
pub mod store;

pub use codec::tcp;
pub use error::*;
pub use frame::*;
