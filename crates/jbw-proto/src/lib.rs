//! `jbw-proto` — the framed, length-prefixed wire protocol between
//! `jbw-client` and `jbw-server`.
//!
//! | Module         | Contents                                             |
//! |----------------|---------------------------------------------------------|
//! | [`tags`]       | Request/response frame tags                          |
//! | [`frame`]      | `Frame`, `read_frame`/`write_frame` over a byte stream |
//! | [`wire`]       | Primitive LE codec (`ByteWriter`/`ByteReader`) plus `agent_state` |
//! | [`config_wire`]| `WorldConfig` codec, shared with `jbw-snapshot`        |
//! | [`request`]    | `Request` — client -> server payloads                 |
//! | [`response`]   | `Response`, `PatchState` — server -> client payloads   |
//! | [`error`]      | `ProtoError`, `ProtoResult`                           |

pub mod config_wire;
pub mod error;
pub mod frame;
pub mod request;
pub mod tags;
pub mod response;
pub mod wire;

pub use error::{ProtoError, ProtoResult};
pub use frame::{read_frame, write_frame, Frame, MAX_FRAME_BYTES};
pub use request::Request;
pub use response::{PatchState, Response};
