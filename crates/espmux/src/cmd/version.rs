use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("espmux {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: espmux");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("ESPMUX_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("ESPMUX_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("features: driver={}, cli=true", cfg!(feature = "driver"));
    println!(
        "defaults: buffer_capacity={}, recv_timeout_ms={}, probe_timeout_ms={}",
        espmux_frame::DEFAULT_BUFFER_CAPACITY,
        espmux_driver::DEFAULT_RECV_TIMEOUT_MS,
        espmux_driver::DEFAULT_PROBE_TIMEOUT_MS
    );

    Ok(SUCCESS)
}
