//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `litedao_core` linkage.
//! - Optionally probe a template location passed as the first argument.

use litedao_core::TemplateLoaderBuilder;

fn main() {
    println!("litedao_core ping={}", litedao_core::ping());
    println!("litedao_core version={}", litedao_core::core_version());

    if let Some(path) = std::env::args().nth(1) {
        match TemplateLoaderBuilder::new().location(&path).load() {
            Ok(registry) => {
                println!("templates loaded from {path}: {}", registry.len());
                for name in registry.names() {
                    println!("  {name}");
                }
            }
            Err(err) => {
                eprintln!("failed to load templates from {path}: {err}");
                std::process::exit(1);
            }
        }
    }
}
