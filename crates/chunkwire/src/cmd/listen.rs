use chunkwire_session::SessionEvent;

use crate::cmd::serve::{serve, Flow};
use crate::cmd::{type_allowed, ListenArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_overflow, print_packet, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let source = args.path.display().to_string();
    let mut printed = 0usize;

    serve(&args.path, |_session, event| {
        match event {
            SessionEvent::Packet(packet) => {
                if !type_allowed(args.types.as_deref(), packet.packet_type) {
                    return Ok(Flow::Continue);
                }
                print_packet(&packet, &source, format);
                printed = printed.saturating_add(1);
            }
            SessionEvent::Overflow { unframed, max } => {
                print_overflow(unframed, max, &source, format);
            }
        }

        match args.count {
            Some(count) if printed >= count => Ok(Flow::Stop),
            _ => Ok(Flow::Continue),
        }
    })?;

    Ok(SUCCESS)
}
