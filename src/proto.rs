//! Hand-maintained subset of the OSMPBF protobuf schema.
//!
//! The wire format (`fileformat.proto` + `osmformat.proto`) has been frozen
//! for years, so instead of generating this file with `prost-build` at build
//! time we keep the handful of messages the reader needs checked in, written
//! in the style prost generates. Fields the engine never looks at (info
//! blocks, changesets, bounding boxes) are omitted; prost skips unknown
//! fields during decode.

/// Envelope around one block of data, possibly compressed.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Blob {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub raw: ::core::option::Option<::std::vec::Vec<u8>>,
    /// Size of `raw`/inflated `zlib_data`, for sanity checking.
    #[prost(int32, optional, tag = "2")]
    pub raw_size: ::core::option::Option<i32>,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub zlib_data: ::core::option::Option<::std::vec::Vec<u8>>,
}

/// Length-prefixed frame preceding every [`Blob`] in the file.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlobHeader {
    /// `"OSMHeader"` or `"OSMData"`.
    #[prost(string, required, tag = "1")]
    pub r#type: ::std::string::String,
    #[prost(int32, required, tag = "3")]
    pub datasize: i32,
}

/// Payload of the single `OSMHeader` blob.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HeaderBlock {
    /// Features a reader must understand to parse the file.
    #[prost(string, repeated, tag = "4")]
    pub required_features: ::std::vec::Vec<::std::string::String>,
    #[prost(string, repeated, tag = "5")]
    pub optional_features: ::std::vec::Vec<::std::string::String>,
}

/// Per-block pool of byte strings; tag keys and values are indices into it.
/// Index 0 is reserved as a delimiter and never referenced.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StringTable {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub s: ::std::vec::Vec<::std::vec::Vec<u8>>,
}

/// Payload of an `OSMData` blob.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PrimitiveBlock {
    #[prost(message, required, tag = "1")]
    pub stringtable: StringTable,
    #[prost(message, repeated, tag = "2")]
    pub primitivegroup: ::std::vec::Vec<PrimitiveGroup>,
    /// Granularity of coordinates, in units of nanodegrees.
    #[prost(int32, optional, tag = "17")]
    pub granularity: ::core::option::Option<i32>,
    #[prost(int64, optional, tag = "19")]
    pub lat_offset: ::core::option::Option<i64>,
    #[prost(int64, optional, tag = "20")]
    pub lon_offset: ::core::option::Option<i64>,
}

/// A group holds exactly one kind of primitive.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PrimitiveGroup {
    #[prost(message, repeated, tag = "1")]
    pub nodes: ::std::vec::Vec<Node>,
    #[prost(message, optional, tag = "2")]
    pub dense: ::core::option::Option<DenseNodes>,
    #[prost(message, repeated, tag = "3")]
    pub ways: ::std::vec::Vec<Way>,
    #[prost(message, repeated, tag = "4")]
    pub relations: ::std::vec::Vec<Relation>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Node {
    #[prost(sint64, required, tag = "1")]
    pub id: i64,
    #[prost(uint32, repeated, tag = "2")]
    pub keys: ::std::vec::Vec<u32>,
    #[prost(uint32, repeated, tag = "3")]
    pub vals: ::std::vec::Vec<u32>,
    /// Latitude in granularity units relative to the block offset.
    #[prost(sint64, required, tag = "8")]
    pub lat: i64,
    #[prost(sint64, required, tag = "9")]
    pub lon: i64,
}

/// Column-oriented node storage; ids and coordinates are delta coded.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DenseNodes {
    #[prost(sint64, repeated, tag = "1")]
    pub id: ::std::vec::Vec<i64>,
    #[prost(sint64, repeated, tag = "8")]
    pub lat: ::std::vec::Vec<i64>,
    #[prost(sint64, repeated, tag = "9")]
    pub lon: ::std::vec::Vec<i64>,
    /// Interleaved key/value string indices, node boundaries marked by 0.
    #[prost(int32, repeated, tag = "10")]
    pub keys_vals: ::std::vec::Vec<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Way {
    #[prost(int64, required, tag = "1")]
    pub id: i64,
    #[prost(uint32, repeated, tag = "2")]
    pub keys: ::std::vec::Vec<u32>,
    #[prost(uint32, repeated, tag = "3")]
    pub vals: ::std::vec::Vec<u32>,
    /// Node references, delta coded: the first value is absolute, every
    /// following value is a signed offset from its predecessor.
    #[prost(sint64, repeated, tag = "8")]
    pub refs: ::std::vec::Vec<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Relation {
    #[prost(int64, required, tag = "1")]
    pub id: i64,
    #[prost(uint32, repeated, tag = "2")]
    pub keys: ::std::vec::Vec<u32>,
    #[prost(uint32, repeated, tag = "3")]
    pub vals: ::std::vec::Vec<u32>,
    #[prost(int32, repeated, tag = "8")]
    pub roles_sid: ::std::vec::Vec<i32>,
    /// Member ids, delta coded like way refs.
    #[prost(sint64, repeated, tag = "9")]
    pub memids: ::std::vec::Vec<i64>,
    #[prost(int32, repeated, tag = "10")]
    pub types: ::std::vec::Vec<i32>,
}
