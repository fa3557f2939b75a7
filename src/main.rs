// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! VAO - Video Annotation Overlay
//!
//! Reference desktop host for the annotation engine. Usage:
//!
//! ```text
//! vao [config.json|config.yaml]
//! ```

mod app;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use app::VaoApp;
use vao::EngineConfig;

fn main() -> Result<()> {
    env_logger::init();

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => EngineConfig::load(&path)?,
        None => EngineConfig::default(),
    };
    let app = VaoApp::new(config)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("VAO - Video Annotation Overlay"),
        ..Default::default()
    };

    eframe::run_native("VAO", options, Box::new(move |_cc| Ok(Box::new(app))))
        .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
