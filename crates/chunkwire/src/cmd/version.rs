use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("chunkwire {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: chunkwire");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target: {}", env!("CHUNKWIRE_BUILD_TARGET"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "rustc: {}",
        option_env!("RUSTC_VERSION").unwrap_or("unknown")
    );
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "features: session={}, async={}, cli=true",
        cfg!(feature = "session"),
        cfg!(feature = "async")
    );
    println!(
        "wire: magic=AABBCCDD trailer=EEFF max_payload={} max_buffer={}",
        chunkwire_frame::MAX_PAYLOAD,
        chunkwire_frame::DEFAULT_MAX_BUFFER
    );

    Ok(SUCCESS)
}
