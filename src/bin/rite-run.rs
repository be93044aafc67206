// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Host-side driver: loads a compiled bytecode image from a file, runs it
//! to completion on a heap-allocated pool, and prints scheduler/allocator
//! statistics. Takes no flags beyond the image path, matching the
//! teacher's own dependency-light CLI posture.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use rite_core::loader;
use rite_core::platform::{FD_STDOUT, Platform};
use rite_core::runtime::Runtime;

/// Default task priority for the image's top-level task.
const DEFAULT_PRIORITY: u8 = 5;

/// Default heap pool size for the host process.
const DEFAULT_POOL_SIZE: usize = 32 * 1024;

struct StdPlatform {
    irq_depth: u32,
}

impl StdPlatform {
    const fn new() -> Self {
        Self { irq_depth: 0 }
    }
}

impl Platform for StdPlatform {
    fn write(&mut self, fd: i32, buf: &[u8]) -> usize {
        let written = if fd == FD_STDOUT {
            io::stdout().write(buf)
        } else {
            io::stderr().write(buf)
        };
        written.unwrap_or(0)
    }

    fn flush(&mut self, fd: i32) {
        let _ = if fd == FD_STDOUT { io::stdout().flush() } else { io::stderr().flush() };
    }

    fn disable_irq(&mut self) {
        self.irq_depth += 1;
    }

    fn enable_irq(&mut self) {
        self.irq_depth = self.irq_depth.saturating_sub(1);
    }

    fn idle(&mut self) {
        std::thread::yield_now();
    }
}

fn run(path: &str) -> Result<(), String> {
    let image = fs::read(path).map_err(|e| format!("{path}: {e}"))?;
    let root = loader::parse_image(&image).map_err(|e| format!("{path}: {e}"))?;

    let mut pool = vec![0u8; DEFAULT_POOL_SIZE];
    let mut runtime = Runtime::init(&mut pool).map_err(|e| format!("init: {e}"))?;

    let task = runtime.create_task(&root, DEFAULT_PRIORITY).map_err(|e| format!("create_task: {e}"))?;
    runtime.start_task(task).map_err(|e| format!("start_task: {e}"))?;

    let mut platform = StdPlatform::new();
    runtime.run(&mut platform);
    platform.flush(FD_STDOUT);

    let stats = runtime.alloc_stats(None);
    eprintln!("heap: {} used / {} total ({} free blocks)", stats.used, stats.total, stats.free_blocks);

    Ok(())
}

fn main() -> ExitCode {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "rite-run".to_string());
    let Some(path) = args.next() else {
        eprintln!("usage: {program} <bytecode-image>");
        return ExitCode::FAILURE;
    };

    match run(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{program}: {msg}");
            ExitCode::FAILURE
        }
    }
}
