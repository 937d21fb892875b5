// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

pub mod network;
pub mod notification;
pub mod sink;
pub mod token;
pub mod util;

pub use network::free_local_socket;
pub use notification::MemoryNotificationSource;
pub use sink::RecordingSink;
pub use token::{TEST_SECRET, sign_token};
pub use util::wait::{wait_for, wait_for_condition};
