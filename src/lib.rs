/*
 *  lib.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Scheduling, rendering and presentation core for the LED matrix
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

//! Threads run [`sched::Scheduler`] loops; the [`render::Renderer`] draws
//! a frame per tick from the callbacks added to it; the
//! [`present::PresenterQueue`] decides which [`present::Presentable`] owns
//! the matrix.

pub mod apps;
pub mod config;
pub mod display;
pub mod present;
pub mod render;
pub mod sched;
pub mod signals;
pub mod stack;
