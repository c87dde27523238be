use packlink_frame::{
    DEFAULT_ACK_TIMEOUT, DEFAULT_MAX_ATTEMPTS, ENCODED_PACKET_LEN, FRAME_OVERHEAD, MAX_ENCODED_LEN,
    PACKET_SIZE, SENTINEL,
};
use packlink_transport::LinkSettings;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("packlink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let settings = LinkSettings::SERIAL_8N1;
    println!("name: packlink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("PACKLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("features: tokio={}, cli=true", cfg!(feature = "tokio"));
    println!("link: {settings}");
    println!(
        "frame: sentinel=0x{SENTINEL:02x}x2 packet={PACKET_SIZE}B encoded={ENCODED_PACKET_LEN}B max_body={MAX_ENCODED_LEN}B"
    );
    println!(
        "frame_time: {}us",
        settings.transmit_micros(ENCODED_PACKET_LEN + FRAME_OVERHEAD)
    );
    println!(
        "retry: attempts={DEFAULT_MAX_ATTEMPTS} ack_timeout={}ms",
        DEFAULT_ACK_TIMEOUT.as_millis()
    );

    Ok(SUCCESS)
}
