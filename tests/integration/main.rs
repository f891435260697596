//! End-to-end tests of the round-trip controller against a scripted
//! in-memory venue.

mod venue;
