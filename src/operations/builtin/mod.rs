// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 内置阶段操作
pub mod inspect;
pub mod seed;
pub mod sequence;
