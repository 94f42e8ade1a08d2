// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

mod api;
mod crawler_manager_test;
mod helpers;
mod pipeline_test;
mod redis_run_state_test;
