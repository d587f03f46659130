//! Request/response frame tags.

pub const CONNECT: u8 = 0x01;
pub const RECONNECT: u8 = 0x02;
pub const ADD_AGENT: u8 = 0x03;
pub const REMOVE_AGENT: u8 = 0x04;
pub const MOVE: u8 = 0x05;
pub const TURN: u8 = 0x06;
pub const NO_OP: u8 = 0x07;
pub const GET_MAP: u8 = 0x08;
pub const GET_AGENT_IDS: u8 = 0x09;
pub const GET_AGENT_STATES: u8 = 0x0A;
pub const SET_ACTIVE: u8 = 0x0B;
pub const IS_ACTIVE: u8 = 0x0C;
/// Server-to-client only; never arrives as a request tag.
pub const STEP: u8 = 0x0D;
