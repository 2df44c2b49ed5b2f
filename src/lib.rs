pub mod assembler;
pub mod cluster;
pub mod codec;
pub mod editor;
pub mod fetch;
pub mod geocode;
pub mod model;
pub mod output;
pub mod script;
pub mod store;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
