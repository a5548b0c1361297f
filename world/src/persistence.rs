//! Chunked binary save format for dungeons.
//!
//! A save is a sequence of chunks. Each chunk starts with a four byte tag,
//! a little-endian `u32` version and a little-endian `u64` payload length,
//! followed by a bincode payload. Chunks appear in a fixed order: `DUNG`
//! (dimensions, cells, sub-cells, height maps, canopy), `CREA`, `CORP`,
//! `ITEM` and `LITE`. Entity records carry their content type by name so the
//! loader can resolve them against the content tables.

use std::io::{Read, Write};

use emberfall_core::{
    config::DungeonConfig, CellCoord, Color, ContentError, CreatureId, CreatureKind, ItemId,
    ItemKind, Light, LightId, Position, TerrainKind,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::{cell::SubCell, creatures::Corpse, grid::Grid, Dungeon};

/// Version written into every chunk header.
pub const SAVE_VERSION: u32 = 1;

const DUNGEON_TAG: [u8; 4] = *b"DUNG";
const CREATURES_TAG: [u8; 4] = *b"CREA";
const CORPSES_TAG: [u8; 4] = *b"CORP";
const ITEMS_TAG: [u8; 4] = *b"ITEM";
const LIGHTS_TAG: [u8; 4] = *b"LITE";

/// Failure while saving or loading a dungeon.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The underlying reader or writer failed.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    /// A chunk payload could not be encoded.
    #[error("failed to encode {chunk} chunk: {source}")]
    Encode {
        /// Tag of the chunk being written.
        chunk: String,
        /// Underlying bincode failure.
        source: bincode::Error,
    },
    /// A chunk payload could not be decoded.
    #[error("failed to decode {chunk} chunk: {source}")]
    Decode {
        /// Tag of the chunk being read.
        chunk: String,
        /// Underlying bincode failure.
        source: bincode::Error,
    },
    /// Chunks appear out of order or carry an unknown tag.
    #[error("expected {expected} chunk, found {found}")]
    UnexpectedChunk {
        /// Tag the loader expected.
        expected: String,
        /// Tag found in the stream.
        found: String,
    },
    /// A chunk was written by an incompatible format version.
    #[error("{chunk} chunk has version {found}, expected {expected}")]
    VersionMismatch {
        /// Tag of the offending chunk.
        chunk: String,
        /// Version this build understands.
        expected: u32,
        /// Version found in the stream.
        found: u32,
    },
    /// A record names a content type that no table recognises.
    #[error(transparent)]
    UnknownContent(#[from] ContentError),
    /// Buffer sizes or references disagree with the recorded dimensions.
    #[error("inconsistent save data: {0}")]
    Inconsistent(String),
}

#[derive(Serialize, Deserialize)]
struct DungeonChunk {
    width: i32,
    height: i32,
    terrain_names: Vec<String>,
    cells: Vec<CellRecord>,
    sub_cells: Vec<SubCell>,
    height_map: Vec<f32>,
    shadow_height: Vec<f32>,
    pre_tree_shadow_height: Vec<f32>,
    canopy: Vec<Color>,
    stairs: Option<CellCoord>,
    spawn_sources: Vec<CellCoord>,
}

#[derive(Serialize, Deserialize)]
struct CellRecord {
    terrain: u8,
    remembered: bool,
}

#[derive(Serialize, Deserialize)]
struct CreatureChunk {
    next_id: u32,
    creatures: Vec<CreatureRecord>,
}

#[derive(Serialize, Deserialize)]
struct CreatureRecord {
    id: u32,
    kind: String,
    position: Position,
}

#[derive(Serialize, Deserialize)]
struct CorpseRecord {
    kind: String,
    position: Position,
}

#[derive(Serialize, Deserialize)]
struct ItemChunk {
    next_id: u32,
    items: Vec<ItemRecord>,
}

#[derive(Serialize, Deserialize)]
struct ItemRecord {
    id: u32,
    kind: String,
    cell: CellCoord,
}

#[derive(Serialize, Deserialize)]
struct LightChunk {
    next_id: u32,
    lights: Vec<(u32, Light)>,
}

/// Writes the dungeon as a sequence of chunks.
pub fn save<W: Write>(dungeon: &Dungeon, mut writer: W) -> Result<(), PersistenceError> {
    write_chunk(&mut writer, DUNGEON_TAG, &dungeon_chunk(dungeon))?;

    let creatures = CreatureChunk {
        next_id: dungeon.creatures.next_id,
        creatures: dungeon
            .creatures()
            .map(|creature| CreatureRecord {
                id: creature.id().get(),
                kind: creature.kind().name().to_owned(),
                position: creature.position(),
            })
            .collect(),
    };
    write_chunk(&mut writer, CREATURES_TAG, &creatures)?;

    let corpses: Vec<CorpseRecord> = dungeon
        .corpses()
        .iter()
        .map(|corpse| CorpseRecord {
            kind: corpse.kind.name().to_owned(),
            position: corpse.position,
        })
        .collect();
    write_chunk(&mut writer, CORPSES_TAG, &corpses)?;

    let items = ItemChunk {
        next_id: dungeon.items.next_id,
        items: dungeon
            .bounds()
            .iter()
            .flat_map(|(x, y)| {
                let cell = CellCoord::new(x, y);
                dungeon
                    .items_at(cell)
                    .iter()
                    .map(move |stacked| ItemRecord {
                        id: stacked.id.get(),
                        kind: stacked.kind.name().to_owned(),
                        cell,
                    })
            })
            .collect(),
    };
    write_chunk(&mut writer, ITEMS_TAG, &items)?;

    let lights = LightChunk {
        next_id: dungeon.next_light_id,
        lights: dungeon
            .lights()
            .map(|(id, light)| (id.get(), light.clone()))
            .collect(),
    };
    write_chunk(&mut writer, LIGHTS_TAG, &lights)?;

    writer.flush()?;
    log::info!(
        "saved {}x{} dungeon ({} creatures, {} corpses, {} items, {} lights)",
        dungeon.width(),
        dungeon.height(),
        creatures.creatures.len(),
        corpses.len(),
        items.items.len(),
        lights.lights.len()
    );
    Ok(())
}

/// Reads a dungeon written by [`save`].
///
/// Any version mismatch, unknown content name or inconsistent buffer aborts
/// the whole load.
pub fn load<R: Read>(mut reader: R, config: DungeonConfig) -> Result<Dungeon, PersistenceError> {
    let chunk: DungeonChunk = read_chunk(&mut reader, DUNGEON_TAG)?;
    let mut dungeon = restore_terrain(chunk, config)?;

    let creatures: CreatureChunk = read_chunk(&mut reader, CREATURES_TAG)?;
    for record in creatures.creatures {
        let kind = CreatureKind::from_name(&record.kind)?;
        if !dungeon.restore_creature(CreatureId::new(record.id), kind, record.position) {
            return Err(PersistenceError::Inconsistent(format!(
                "creature {} lies outside the map",
                record.id
            )));
        }
    }
    dungeon.creatures.next_id = creatures.next_id;

    let corpses: Vec<CorpseRecord> = read_chunk(&mut reader, CORPSES_TAG)?;
    for record in corpses {
        dungeon.insert_corpse(Corpse {
            kind: CreatureKind::from_name(&record.kind)?,
            position: record.position,
        });
    }

    let items: ItemChunk = read_chunk(&mut reader, ITEMS_TAG)?;
    for record in items.items {
        let kind = ItemKind::from_name(&record.kind)?;
        if !dungeon.restore_item(ItemId::new(record.id), kind, record.cell) {
            return Err(PersistenceError::Inconsistent(format!(
                "item {} lies outside the map",
                record.id
            )));
        }
    }
    dungeon.items.next_id = items.next_id;

    let lights: LightChunk = read_chunk(&mut reader, LIGHTS_TAG)?;
    dungeon.lights = lights
        .lights
        .into_iter()
        .map(|(id, light)| (LightId::new(id), light))
        .collect();
    dungeon.next_light_id = lights.next_id;

    log::info!(
        "loaded {}x{} dungeon ({} creatures, {} items)",
        dungeon.width(),
        dungeon.height(),
        dungeon.creature_count(),
        dungeon.items().count()
    );
    Ok(dungeon)
}

fn dungeon_chunk(dungeon: &Dungeon) -> DungeonChunk {
    let terrain_names = TerrainKind::ALL
        .iter()
        .map(|kind| kind.name().to_owned())
        .collect();
    let cells = dungeon
        .cells
        .as_slice()
        .iter()
        .map(|cell| CellRecord {
            terrain: TerrainKind::ALL
                .iter()
                .position(|kind| *kind == cell.terrain())
                .unwrap_or(0) as u8,
            remembered: cell.is_remembered(),
        })
        .collect();
    DungeonChunk {
        width: dungeon.width,
        height: dungeon.height,
        terrain_names,
        cells,
        sub_cells: dungeon.sub_cells.as_slice().to_vec(),
        height_map: dungeon.height_map.as_slice().to_vec(),
        shadow_height: dungeon.shadow_height.as_slice().to_vec(),
        pre_tree_shadow_height: dungeon.pre_tree_shadow_height.as_slice().to_vec(),
        canopy: dungeon.canopy.as_slice().to_vec(),
        stairs: dungeon.stairs,
        spawn_sources: dungeon.spawn_sources.clone(),
    }
}

fn restore_terrain(
    chunk: DungeonChunk,
    config: DungeonConfig,
) -> Result<Dungeon, PersistenceError> {
    if chunk.width < 0 || chunk.height < 0 {
        return Err(PersistenceError::Inconsistent(format!(
            "negative dimensions {}x{}",
            chunk.width, chunk.height
        )));
    }
    let palette = chunk
        .terrain_names
        .iter()
        .map(|name| TerrainKind::from_name(name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut dungeon = Dungeon::new(chunk.width, chunk.height, config);
    if chunk.cells.len() != dungeon.cells.as_slice().len() {
        return Err(PersistenceError::Inconsistent(format!(
            "{} cells recorded for a {}x{} map",
            chunk.cells.len(),
            chunk.width,
            chunk.height
        )));
    }
    for (index, record) in chunk.cells.iter().enumerate() {
        let terrain = palette
            .get(usize::from(record.terrain))
            .copied()
            .ok_or_else(|| {
                PersistenceError::Inconsistent(format!(
                    "terrain index {} outside the palette",
                    record.terrain
                ))
            })?;
        let index = index as i32;
        let cell = CellCoord::new(index % chunk.width, index / chunk.width);
        if !dungeon.set_terrain(cell, terrain) {
            return Err(PersistenceError::Inconsistent(format!(
                "cell {index} lies outside a {}x{} map",
                chunk.width, chunk.height
            )));
        }
        dungeon.cells[(cell.x(), cell.y())].set_remembered(record.remembered);
    }

    let sub_width = dungeon.sub_cells.width();
    let sub_height = dungeon.sub_cells.height();
    dungeon.sub_cells = sized(sub_width, sub_height, chunk.sub_cells, "sub-cell")?;
    dungeon.height_map = sized(sub_width, sub_height, chunk.height_map, "height map")?;
    dungeon.shadow_height = sized(sub_width, sub_height, chunk.shadow_height, "shadow map")?;
    dungeon.pre_tree_shadow_height = sized(
        sub_width,
        sub_height,
        chunk.pre_tree_shadow_height,
        "pre-tree shadow map",
    )?;
    dungeon.canopy = sized(sub_width, sub_height, chunk.canopy, "canopy")?;

    if let Some(stairs) = chunk.stairs {
        if dungeon.terrain(stairs) != Some(TerrainKind::Stairs) {
            return Err(PersistenceError::Inconsistent(format!(
                "stairs recorded at ({}, {}) on non-stair terrain",
                stairs.x(),
                stairs.y()
            )));
        }
    }
    dungeon.stairs = chunk.stairs;
    for source in chunk.spawn_sources {
        if !dungeon.add_spawn_source(source) {
            return Err(PersistenceError::Inconsistent(format!(
                "spawn source recorded at ({}, {}) is off the map or repeated",
                source.x(),
                source.y()
            )));
        }
    }
    Ok(dungeon)
}

fn sized<T>(
    width: i32,
    height: i32,
    cells: Vec<T>,
    label: &str,
) -> Result<Grid<T>, PersistenceError> {
    let len = cells.len();
    Grid::from_vec(width, height, cells).ok_or_else(|| {
        PersistenceError::Inconsistent(format!(
            "{label} buffer holds {len} entries for {width}x{height}"
        ))
    })
}

fn tag_name(tag: [u8; 4]) -> String {
    String::from_utf8_lossy(&tag).into_owned()
}

fn write_chunk<W, T>(writer: &mut W, tag: [u8; 4], payload: &T) -> Result<(), PersistenceError>
where
    W: Write,
    T: Serialize,
{
    let bytes = bincode::serialize(payload).map_err(|source| PersistenceError::Encode {
        chunk: tag_name(tag),
        source,
    })?;
    writer.write_all(&tag)?;
    writer.write_all(&SAVE_VERSION.to_le_bytes())?;
    writer.write_all(&(bytes.len() as u64).to_le_bytes())?;
    writer.write_all(&bytes)?;
    Ok(())
}

fn read_chunk<R, T>(reader: &mut R, expected: [u8; 4]) -> Result<T, PersistenceError>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut tag = [0_u8; 4];
    reader.read_exact(&mut tag)?;
    if tag != expected {
        return Err(PersistenceError::UnexpectedChunk {
            expected: tag_name(expected),
            found: tag_name(tag),
        });
    }

    let mut version = [0_u8; 4];
    reader.read_exact(&mut version)?;
    let version = u32::from_le_bytes(version);
    if version != SAVE_VERSION {
        return Err(PersistenceError::VersionMismatch {
            chunk: tag_name(tag),
            expected: SAVE_VERSION,
            found: version,
        });
    }

    let mut length = [0_u8; 8];
    reader.read_exact(&mut length)?;
    let length = u64::from_le_bytes(length);
    let mut payload = Vec::new();
    let read = reader.by_ref().take(length).read_to_end(&mut payload)?;
    if read as u64 != length {
        return Err(PersistenceError::Inconsistent(format!(
            "{} chunk truncated: {read} of {length} bytes",
            tag_name(tag)
        )));
    }

    bincode::deserialize(&payload).map_err(|source| PersistenceError::Decode {
        chunk: tag_name(tag),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_header_is_tag_version_length() {
        let mut bytes = Vec::new();
        write_chunk(&mut bytes, LIGHTS_TAG, &7_u32).expect("write");
        assert_eq!(&bytes[..4], b"LITE");
        assert_eq!(&bytes[4..8], &SAVE_VERSION.to_le_bytes());
        assert_eq!(&bytes[8..16], &4_u64.to_le_bytes());
        assert_eq!(bytes.len(), 20);
    }

    #[test]
    fn spawn_source_off_the_map_is_inconsistent() {
        let dungeon = Dungeon::new(4, 4, DungeonConfig::default());
        let mut chunk = dungeon_chunk(&dungeon);
        chunk.spawn_sources.push(CellCoord::new(9, 1));
        let error = restore_terrain(chunk, DungeonConfig::default()).expect_err("off the map");
        assert!(matches!(
            error,
            PersistenceError::Inconsistent(ref reason) if reason.contains("(9, 1)")
        ));
    }

    #[test]
    fn wrong_tag_is_reported() {
        let mut bytes = Vec::new();
        write_chunk(&mut bytes, ITEMS_TAG, &0_u32).expect("write");
        let error = read_chunk::<_, u32>(&mut bytes.as_slice(), CORPSES_TAG).expect_err("tag");
        assert!(matches!(
            error,
            PersistenceError::UnexpectedChunk { ref expected, ref found }
                if expected == "CORP" && found == "ITEM"
        ));
    }

    #[test]
    fn truncated_payload_is_reported() {
        let mut bytes = Vec::new();
        write_chunk(&mut bytes, ITEMS_TAG, &0_u64).expect("write");
        bytes.truncate(bytes.len() - 3);
        let error = read_chunk::<_, u64>(&mut bytes.as_slice(), ITEMS_TAG).expect_err("short");
        assert!(matches!(error, PersistenceError::Inconsistent(_)));
    }
}
