// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! API types shared between the Foyer server and its clients.

pub mod invitations;
pub mod webhooks;
