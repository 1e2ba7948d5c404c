use chunkwire_frame::{encode, Packet};

use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = args.payload.resolve()?;
    let packet = Packet::new(args.packet_type, args.seq, payload)
        .map_err(|err| frame_error("encode failed", err))?;
    let wire = encode(&packet);
    print_frame(&packet, &wire, format);
    Ok(SUCCESS)
}
