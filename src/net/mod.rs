/*!
 * Network Utilities
 * Buffers, checksums and socket notification shared by protocol layers
 */

pub mod buffer;
pub mod checksum;
pub mod notify;
pub mod user_buffer;

pub use buffer::{ByteBuffer, NetBuffer};
pub use checksum::{accumulate, checksum, combine, fold, Checksum};
pub use notify::{notify_socket, SocketEvent, SocketNotifier};
pub use user_buffer::UserBuffer;
