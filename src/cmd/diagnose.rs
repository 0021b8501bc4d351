use anyhow::Result;

use patscrape::browser_detect::RenderSupport;
use patscrape::config::config_path;

pub fn cmd_diagnose(json: bool) -> Result<bool> {
    let support = RenderSupport::detect();

    if json {
        println!("{}", serde_json::to_string_pretty(&support)?);
        return Ok(true);
    }

    println!("patscrape {}", patscrape::VERSION);
    println!("Config file: {}", config_path().display());
    println!(
        "Rendered retrieval compiled in: {}",
        if support.compiled { "yes" } else { "no (build with --features rendered)" }
    );
    match &support.chrome {
        Some(path) => println!("Chrome executable: {}", path.display()),
        None => println!("Chrome executable: not found on PATH"),
    }
    println!(
        "Rendered retrieval usable: {}",
        if support.usable() { "yes" } else { "no" }
    );
    Ok(true)
}
