//! The dense index/level codec.
//!
//! Cell ids are allocated in contiguous per-level blocks: ids `1..=n0`
//! are level 0 in row-major order (`i` fastest), the next `8 * n0` ids
//! are level 1, and so on. Encoding and decoding are pure arithmetic over
//! the [`BaseResolution`]; the hierarchy (parent, children, siblings) is
//! likewise derived by index arithmetic, so no cell ever stores a pointer
//! to another.

use std::fmt;

use crate::error::CodecError;
use crate::id::{CellId, Level, MultiIndex};

/// Per-axis cell counts `(nx, ny, nz)` at level 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BaseResolution(pub [u64; 3]);

impl BaseResolution {
    /// Construct from per-axis counts.
    pub fn new(nx: u64, ny: u64, nz: u64) -> Self {
        Self([nx, ny, nz])
    }

    /// Per-axis counts as an array.
    pub fn counts(&self) -> [u64; 3] {
        self.0
    }

    /// Total cell count at level 0, or `None` on 64-bit overflow.
    fn checked_cell_count(&self) -> Option<u64> {
        self.0[0]
            .checked_mul(self.0[1])
            .and_then(|p| p.checked_mul(self.0[2]))
    }
}

impl fmt::Display for BaseResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.0[0], self.0[1], self.0[2])
    }
}

/// Bijective mapping between `(MultiIndex, Level)` pairs and [`CellId`]s.
///
/// Construction derives the maximum refinement level from the base
/// resolution: the largest `L` such that the cumulative id count through
/// level `L` still fits in a `u64`. A base resolution that cannot address
/// even level 0 fails construction with [`CodecError::BaseTooLarge`];
/// a successfully built codec never fails on capacity at runtime.
#[derive(Clone, Debug)]
pub struct Codec {
    base: BaseResolution,
    max_level: Level,
    /// `level_offsets[l]` is the number of ids preceding level `l`'s block.
    level_offsets: Vec<u64>,
    /// Highest addressable id (ids are `1..=last_id`).
    last_id: u64,
}

impl Codec {
    /// Build a codec for the given base resolution.
    ///
    /// # Errors
    ///
    /// [`CodecError::ZeroResolution`] if any axis count is zero;
    /// [`CodecError::BaseTooLarge`] if the level-0 cell count overflows
    /// the 64-bit id range.
    pub fn new(base: BaseResolution) -> Result<Self, CodecError> {
        for (axis, &n) in base.0.iter().enumerate() {
            if n == 0 {
                return Err(CodecError::ZeroResolution { axis });
            }
        }
        let n0 = base.checked_cell_count().ok_or(CodecError::BaseTooLarge)?;

        // Grow the level table until the next block would overflow u64.
        let mut level_offsets = vec![0u64];
        let mut total = n0;
        let mut level = 0u32;
        loop {
            let block = match 1u64
                .checked_shl(3 * (level + 1))
                .and_then(|f| n0.checked_mul(f))
            {
                Some(b) => b,
                None => break,
            };
            let new_total = match total.checked_add(block) {
                Some(t) => t,
                None => break,
            };
            level_offsets.push(total);
            total = new_total;
            level += 1;
        }

        Ok(Self {
            base,
            max_level: Level(level),
            level_offsets,
            last_id: total,
        })
    }

    /// The base resolution this codec was built for.
    pub fn base(&self) -> BaseResolution {
        self.base
    }

    /// Largest refinement level this codec can address.
    pub fn max_refinement_level(&self) -> Level {
        self.max_level
    }

    /// Highest id this codec can produce.
    pub fn last_id(&self) -> CellId {
        CellId(self.last_id)
    }

    /// Per-axis resolution at `level`: `base * 2^level`.
    ///
    /// # Errors
    ///
    /// [`CodecError::LevelOutOfRange`] if `level` exceeds the maximum.
    pub fn resolution(&self, level: Level) -> Result<[u64; 3], CodecError> {
        self.check_level(level)?;
        let [nx, ny, nz] = self.base.0;
        Ok([nx << level.0, ny << level.0, nz << level.0])
    }

    fn check_level(&self, level: Level) -> Result<(), CodecError> {
        if level > self.max_level {
            return Err(CodecError::LevelOutOfRange {
                level,
                max: self.max_level,
            });
        }
        Ok(())
    }

    /// Encode a `(multi-index, level)` pair into a cell id.
    ///
    /// # Errors
    ///
    /// [`CodecError::LevelOutOfRange`] for a level past the maximum;
    /// [`CodecError::InvalidIndex`] if any component of `index` is
    /// outside `[0, resolution(level))`.
    pub fn encode(&self, index: MultiIndex, level: Level) -> Result<CellId, CodecError> {
        let [rx, ry, rz] = self.resolution(level)?;
        if index[0] >= rx || index[1] >= ry || index[2] >= rz {
            return Err(CodecError::InvalidIndex { index, level });
        }
        let rank = index[0] + index[1] * rx + index[2] * rx * ry;
        Ok(CellId(1 + self.level_offsets[level.0 as usize] + rank))
    }

    /// Decode a cell id back into its `(multi-index, level)` pair.
    ///
    /// Exact inverse of [`encode`](Self::encode) for any id it produced.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidId`] for zero or past-the-end ids.
    pub fn decode(&self, id: CellId) -> Result<(MultiIndex, Level), CodecError> {
        let level = self.level_of(id)?;
        let [rx, ry, _] = self.resolution(level)?;
        let rank = id.0 - 1 - self.level_offsets[level.0 as usize];
        let index = [rank % rx, (rank / rx) % ry, rank / (rx * ry)];
        Ok((index, level))
    }

    /// The refinement level an id belongs to.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidId`] for zero or past-the-end ids.
    pub fn level_of(&self, id: CellId) -> Result<Level, CodecError> {
        if id.0 == 0 || id.0 > self.last_id {
            return Err(CodecError::InvalidId { id });
        }
        let n = self.level_offsets.partition_point(|&off| off < id.0);
        Ok(Level((n - 1) as u32))
    }

    /// The parent id one level coarser, or `None` for level-0 cells.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidId`] if `id` is not addressable.
    pub fn parent(&self, id: CellId) -> Result<Option<CellId>, CodecError> {
        let (index, level) = self.decode(id)?;
        if level.0 == 0 {
            return Ok(None);
        }
        let parent_index = [index[0] / 2, index[1] / 2, index[2] / 2];
        Ok(Some(self.encode(parent_index, Level(level.0 - 1))?))
    }

    /// The eight child ids one level finer, ordered `i` fastest then `j`
    /// then `k` (matching the row-major id layout within a level).
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidId`] if `id` is not addressable;
    /// [`CodecError::LevelOutOfRange`] if `id` is already at the maximum
    /// refinement level.
    pub fn children(&self, id: CellId) -> Result<[CellId; 8], CodecError> {
        let (index, level) = self.decode(id)?;
        if level == self.max_level {
            return Err(CodecError::LevelOutOfRange {
                level: Level(level.0 + 1),
                max: self.max_level,
            });
        }
        let child_level = Level(level.0 + 1);
        let mut children = [CellId(0); 8];
        let mut n = 0;
        for dk in 0..2u64 {
            for dj in 0..2u64 {
                for di in 0..2u64 {
                    let child = [index[0] * 2 + di, index[1] * 2 + dj, index[2] * 2 + dk];
                    children[n] = self.encode(child, child_level)?;
                    n += 1;
                }
            }
        }
        Ok(children)
    }

    /// The full sibling octet containing `id` (including `id` itself),
    /// or `None` for level-0 cells, which have no siblings.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidId`] if `id` is not addressable.
    pub fn siblings(&self, id: CellId) -> Result<Option<[CellId; 8]>, CodecError> {
        match self.parent(id)? {
            Some(parent) => Ok(Some(self.children(parent)?)),
            None => Ok(None),
        }
    }

    /// The ancestor of `id` at the given coarser `level`.
    ///
    /// Returns `id` itself when `level` equals the id's own level.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidId`] if `id` is not addressable;
    /// [`CodecError::LevelOutOfRange`] if `level` is finer than the id's
    /// own level.
    pub fn ancestor_at(&self, id: CellId, level: Level) -> Result<CellId, CodecError> {
        let (index, own_level) = self.decode(id)?;
        if level > own_level {
            return Err(CodecError::LevelOutOfRange {
                level,
                max: own_level,
            });
        }
        let shift = own_level.0 - level.0;
        let coarse = [index[0] >> shift, index[1] >> shift, index[2] >> shift];
        self.encode(coarse, level)
    }
}
