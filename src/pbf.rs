//! PBF input layer: blob framing, block classification, and the
//! handler-driven reader.
//!
//! A [`Reader`] memory-maps the input once and indexes its blobs up front, so
//! each of the engine's passes is a cheap sequential rescan that decodes only
//! the block types it has handlers for. Repeated scans of the same file are
//! served from the page cache.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use byteorder::{ByteOrder, NetworkEndian};
use flate2::read::ZlibDecoder;
use itertools::Itertools;
use log::debug;
use memmap2::Mmap;
use prost::Message;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::proto;

/// Features this reader understands; a file requiring anything else is
/// rejected up front.
const SUPPORTED_FEATURES: [&str; 2] = ["OsmSchema-V0.6", "DenseNodes"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockType {
    Header,
    Nodes,
    DenseNodes,
    Ways,
    Relations,
}

impl BlockType {
    /// Sniffs the payload type of an `OSMData` blob without a full decode.
    ///
    /// Walks the top-level fields of the `PrimitiveBlock` message with the
    /// raw prost codec and inspects the tag of the first field inside the
    /// first `PrimitiveGroup`. Per the OSMPBF convention every group in a
    /// block holds the same single kind of primitive, so one tag settles the
    /// whole block.
    fn from_osmdata_payload(mut payload: &[u8]) -> Result<Self> {
        const PRIMITIVE_GROUP_TAG: u32 = 2;
        const NODES_TAG: u32 = 1;
        const DENSE_NODES_TAG: u32 = 2;
        const WAYS_TAG: u32 = 3;
        const RELATIONS_TAG: u32 = 4;
        const CHANGESETS_TAG: u32 = 5;

        while !payload.is_empty() {
            let (key, wire_type) = prost::encoding::decode_key(&mut payload)?;
            if key != PRIMITIVE_GROUP_TAG {
                prost::encoding::skip_field(
                    wire_type,
                    key,
                    &mut payload,
                    prost::encoding::DecodeContext::default(),
                )?;
                continue;
            }

            // Length of the group message, then the tag of its first field.
            let _ = prost::encoding::decode_varint(&mut payload)?;
            let (tag, _wire_type) = prost::encoding::decode_key(&mut payload)?;
            return match tag {
                NODES_TAG => Ok(BlockType::Nodes),
                DENSE_NODES_TAG => Ok(BlockType::DenseNodes),
                WAYS_TAG => Ok(BlockType::Ways),
                RELATIONS_TAG => Ok(BlockType::Relations),
                CHANGESETS_TAG => Err(Error::ChangesetsUnsupported),
                _ => Err(Error::MalformedBlock),
            };
        }
        Err(Error::MalformedBlock)
    }
}

/// Location and kind of one blob inside the input file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockIndex {
    pub block_type: BlockType,
    pub blob_start: usize,
    pub blob_len: usize,
}

/// Blob whose kind is not yet known; classification needs the payload.
struct RawBlob {
    is_header: bool,
    blob_start: usize,
    blob_len: usize,
    data: Vec<u8>,
}

struct BlobIterator<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> BlobIterator<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }

    fn read(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.cursor.checked_add(len).ok_or(Error::TruncatedBlob)?;
        if end > self.data.len() {
            return Err(Error::TruncatedBlob);
        }
        let data = &self.data[self.cursor..end];
        self.cursor = end;
        Ok(data)
    }

    fn next_blob(&mut self) -> Result<RawBlob> {
        let header_len = NetworkEndian::read_i32(self.read(4)?);
        if header_len < 0 {
            return Err(Error::MalformedFrame);
        }
        let blob_header = proto::BlobHeader::decode(self.read(header_len as usize)?)?;
        if blob_header.datasize < 0 {
            return Err(Error::MalformedFrame);
        }

        let blob_start = self.cursor;
        let blob_len = blob_header.datasize as usize;
        let data = self.read(blob_len)?.to_vec();

        let is_header = match blob_header.r#type.as_str() {
            "OSMHeader" => true,
            "OSMData" => false,
            other => return Err(Error::UnknownBlobType(other.to_string())),
        };
        Ok(RawBlob {
            is_header,
            blob_start,
            blob_len,
            data,
        })
    }
}

impl<'a> Iterator for BlobIterator<'a> {
    type Item = Result<RawBlob>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor < self.data.len() {
            Some(self.next_blob())
        } else {
            None
        }
    }
}

/// Unpacks a blob payload, inflating zlib data if necessary.
fn decompress(blob: proto::Blob) -> Result<Vec<u8>> {
    if let Some(raw) = blob.raw {
        Ok(raw)
    } else if let Some(zlib_data) = blob.zlib_data {
        let mut payload = Vec::with_capacity(blob.raw_size.unwrap_or(0).max(0) as usize);
        ZlibDecoder::new(&zlib_data[..]).read_to_end(&mut payload)?;
        if let Some(expected) = blob.raw_size {
            if payload.len() != expected as usize {
                return Err(Error::MalformedBlock);
            }
        }
        Ok(payload)
    } else {
        Err(Error::UnsupportedCompression)
    }
}

/// Decodes the blob at `idx` into a message of type `T`.
fn read_block<T: Message + Default>(data: &[u8], idx: &BlockIndex) -> Result<T> {
    let end = idx
        .blob_start
        .checked_add(idx.blob_len)
        .filter(|&end| end <= data.len())
        .ok_or(Error::TruncatedBlob)?;
    let blob = proto::Blob::decode(&data[idx.blob_start..end])?;
    let payload = decompress(blob)?;
    Ok(T::decode(payload.as_slice())?)
}

fn classify(blob: RawBlob) -> Result<BlockIndex> {
    let payload = decompress(proto::Blob::decode(blob.data.as_slice())?)?;
    let block_type = if blob.is_header {
        let header = proto::HeaderBlock::decode(payload.as_slice())?;
        for feature in &header.required_features {
            if !SUPPORTED_FEATURES.contains(&feature.as_str()) {
                return Err(Error::UnsupportedFeature(feature.clone()));
            }
        }
        BlockType::Header
    } else {
        BlockType::from_osmdata_payload(&payload)?
    };
    Ok(BlockIndex {
        block_type,
        blob_start: blob.blob_start,
        blob_len: blob.blob_len,
    })
}

/// Walks the blob frames and classifies each one. Classification inflates
/// every blob once, so it is spread over a thread pool; the resulting index
/// is sorted by `(type, offset)` and deterministic for a fixed input.
fn build_block_index(data: &[u8]) -> Result<Vec<BlockIndex>> {
    let mut index: Vec<BlockIndex> = BlobIterator::new(data)
        .par_bridge()
        .map(|blob| classify(blob?))
        .collect::<Result<_>>()?;
    index.par_sort_unstable();

    let counts = index.iter().counts_by(|idx| idx.block_type);
    debug!(
        "block index: {} node, {} dense-node, {} way, {} relation blocks",
        counts.get(&BlockType::Nodes).copied().unwrap_or(0),
        counts.get(&BlockType::DenseNodes).copied().unwrap_or(0),
        counts.get(&BlockType::Ways).copied().unwrap_or(0),
        counts.get(&BlockType::Relations).copied().unwrap_or(0),
    );
    Ok(index)
}

/// A decoded OSM node with coordinates resolved to nanodegrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    pub id: i64,
    pub lat_nano: i64,
    pub lon_nano: i64,
}

pub type NodeHandler<'a> = Box<dyn FnMut(&Node) -> Result<()> + 'a>;
pub type WayHandler<'a> = Box<dyn FnMut(&proto::Way, &proto::StringTable) -> Result<()> + 'a>;
pub type RelationHandler<'a> =
    Box<dyn FnMut(&proto::Relation, &proto::StringTable) -> Result<()> + 'a>;

/// Handler triple for one scan of the file. A `None` handler leaves blocks of
/// the corresponding type undecoded.
///
/// Node handlers receive coordinates already resolved from the block's
/// granularity and offset. Way handlers receive the raw message, references
/// still delta coded, together with the block's string table so tag keys can
/// be compared as byte slices without copies.
#[derive(Default)]
pub struct Handlers<'a> {
    pub node: Option<NodeHandler<'a>>,
    pub way: Option<WayHandler<'a>>,
    pub relation: Option<RelationHandler<'a>>,
}

impl Handlers<'_> {
    fn wants(&self, block_type: BlockType) -> bool {
        match block_type {
            BlockType::Header => false,
            BlockType::Nodes | BlockType::DenseNodes => self.node.is_some(),
            BlockType::Ways => self.way.is_some(),
            BlockType::Relations => self.relation.is_some(),
        }
    }
}

fn dispatch_block(block: &proto::PrimitiveBlock, handlers: &mut Handlers) -> Result<()> {
    let granularity = i64::from(block.granularity.unwrap_or(100));
    let lat_offset = block.lat_offset.unwrap_or(0);
    let lon_offset = block.lon_offset.unwrap_or(0);
    let strings = &block.stringtable;

    for group in &block.primitivegroup {
        if let Some(on_node) = handlers.node.as_mut() {
            for node in &group.nodes {
                on_node(&Node {
                    id: node.id,
                    lat_nano: lat_offset + granularity * node.lat,
                    lon_nano: lon_offset + granularity * node.lon,
                })?;
            }
            if let Some(dense) = &group.dense {
                if dense.lat.len() != dense.id.len() || dense.lon.len() != dense.id.len() {
                    return Err(Error::MalformedBlock);
                }
                let (mut id, mut lat, mut lon) = (0i64, 0i64, 0i64);
                for i in 0..dense.id.len() {
                    id += dense.id[i];
                    lat += dense.lat[i];
                    lon += dense.lon[i];
                    on_node(&Node {
                        id,
                        lat_nano: lat_offset + granularity * lat,
                        lon_nano: lon_offset + granularity * lon,
                    })?;
                }
            }
        }
        if let Some(on_way) = handlers.way.as_mut() {
            for way in &group.ways {
                on_way(way, strings)?;
            }
        }
        if let Some(on_relation) = handlers.relation.as_mut() {
            for relation in &group.relations {
                on_relation(relation, strings)?;
            }
        }
    }
    Ok(())
}

/// Sequential access to the records of one osm.pbf file.
///
/// Opening a reader maps the file and builds the block index once; every
/// [`process`](Reader::process) call afterwards is an independent scan that
/// delivers records in file order, nodes before ways before relations.
pub struct Reader {
    data: Mmap,
    index: Vec<BlockIndex>,
}

impl Reader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let data = unsafe { Mmap::map(&file)? };
        let index = build_block_index(&data)?;
        Ok(Self { data, index })
    }

    /// Runs one scan, dispatching each record to the matching handler. The
    /// first handler error aborts the scan and is returned.
    pub fn process(&self, mut handlers: Handlers) -> Result<()> {
        for idx in &self.index {
            if !handlers.wants(idx.block_type) {
                continue;
            }
            let block: proto::PrimitiveBlock = read_block(&self.data, idx)?;
            dispatch_block(&block, &mut handlers)?;
        }
        Ok(())
    }

    pub fn num_blocks(&self) -> usize {
        self.index.len()
    }
}
