use delve_geom::{BlockBox, BlockPos};
use rand::Rng;

use crate::catalog::{DungeonCatalog, LayoutParams};
use crate::error::DungeonError;
use crate::rng::{DungeonRng, layout_rng};
use crate::theme::ThemeId;

pub const MIN_CORRIDOR_WIDTH: i32 = 7;
pub const ROOM_COUNT: usize = 8;

const WALK_ATTEMPTS: usize = 64;
// Open cells a corridor must run between the two wall columns it cuts.
const MIN_CORRIDOR_RUN: i32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoomKind {
    Entrance,
    Fight1,
    Fight2,
    Fight3,
    Fight4,
    Boss,
    Treasure,
    Exit,
}

impl RoomKind {
    /// Order rooms are chained in, which is also their id order.
    pub const CHAIN: [RoomKind; ROOM_COUNT] = [
        RoomKind::Entrance,
        RoomKind::Fight1,
        RoomKind::Fight2,
        RoomKind::Fight3,
        RoomKind::Fight4,
        RoomKind::Boss,
        RoomKind::Treasure,
        RoomKind::Exit,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_fight(self) -> bool {
        matches!(
            self,
            RoomKind::Fight1 | RoomKind::Fight2 | RoomKind::Fight3 | RoomKind::Fight4
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            RoomKind::Entrance => "entrance",
            RoomKind::Fight1 => "fight1",
            RoomKind::Fight2 => "fight2",
            RoomKind::Fight3 => "fight3",
            RoomKind::Fight4 => "fight4",
            RoomKind::Boss => "boss",
            RoomKind::Treasure => "treasure",
            RoomKind::Exit => "exit",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoomId(pub u8);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub kind: RoomKind,
    /// Cell on the coarse room grid.
    pub cell: (i32, i32),
    /// Walkable interior, floor at y = 0. Walls stand one cell outside it.
    pub bounds: BlockBox,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Z,
}

/// Corridor direction relative to the chain: `Forward` runs along the primary axis,
/// `Right` across it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelativeAxis {
    Forward,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CorridorKind {
    Chain,
    Branch,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Corridor {
    pub room_a: RoomId,
    pub room_b: RoomId,
    /// Direction of travel.
    pub axis: Axis,
    pub width: i32,
    pub kind: CorridorKind,
    /// Walkable interior, spanning both doorway columns.
    pub bounds: BlockBox,
}

impl Corridor {
    pub fn connects(&self, a: RoomId, b: RoomId) -> bool {
        (self.room_a == a && self.room_b == b) || (self.room_a == b && self.room_b == a)
    }

    /// Extent across the direction of travel.
    pub fn span(&self) -> i32 {
        match self.axis {
            Axis::X => self.bounds.size_z(),
            Axis::Z => self.bounds.size_x(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DungeonLayout {
    pub theme: ThemeId,
    pub seed: u64,
    pub rooms: [Room; ROOM_COUNT],
    pub corridors: Vec<Corridor>,
}

impl DungeonLayout {
    pub fn room(&self, kind: RoomKind) -> &Room {
        &self.rooms[kind.index()]
    }

    pub fn room_by_id(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(usize::from(id.0))
    }

    /// Axis most chain corridors travel along. Ties go to X.
    pub fn primary_axis(&self) -> Axis {
        let chain = self.corridors.iter().filter(|c| c.kind == CorridorKind::Chain);
        let x = chain.clone().filter(|c| c.axis == Axis::X).count();
        let z = chain.count() - x;
        if x >= z { Axis::X } else { Axis::Z }
    }

    pub fn relative_axis(&self, corridor: &Corridor) -> RelativeAxis {
        if corridor.axis == self.primary_axis() {
            RelativeAxis::Forward
        } else {
            RelativeAxis::Right
        }
    }

    /// Box covering every room and corridor including their walls.
    pub fn footprint(&self) -> BlockBox {
        let first = self.rooms[0].bounds.expand_xz(1);
        self.rooms
            .iter()
            .map(|r| r.bounds.expand_xz(1))
            .chain(self.corridors.iter().map(|c| c.bounds.expand_xz(1)))
            .fold(first, |acc, b| acc.union(&b))
    }

    pub fn validate(&self) -> Result<(), DungeonError> {
        for (i, (room, kind)) in self.rooms.iter().zip(RoomKind::CHAIN).enumerate() {
            if room.kind != kind || usize::from(room.id.0) != i {
                return Err(DungeonError::geometry(format!(
                    "room {i} is {:?} (id {}), expected {kind:?}",
                    room.kind, room.id.0
                )));
            }
            if room.bounds.is_empty() {
                return Err(DungeonError::geometry(format!("room {} is empty", kind.name())));
            }
        }
        for (i, a) in self.rooms.iter().enumerate() {
            for b in &self.rooms[i + 1..] {
                if a.bounds.expand_xz(1).intersects(&b.bounds.expand_xz(1)) {
                    return Err(DungeonError::geometry(format!(
                        "rooms {} and {} overlap",
                        a.kind.name(),
                        b.kind.name()
                    )));
                }
            }
        }
        if self.corridors.len() < ROOM_COUNT - 1 {
            return Err(DungeonError::geometry(format!(
                "{} corridors, need at least {}",
                self.corridors.len(),
                ROOM_COUNT - 1
            )));
        }
        for c in &self.corridors {
            if c.width < MIN_CORRIDOR_WIDTH || c.span() != c.width {
                return Err(DungeonError::geometry(format!(
                    "corridor {}-{} is {} wide (declared {}), minimum {MIN_CORRIDOR_WIDTH}",
                    c.room_a.0,
                    c.room_b.0,
                    c.span(),
                    c.width
                )));
            }
            if self.room_by_id(c.room_a).is_none() || self.room_by_id(c.room_b).is_none() {
                return Err(DungeonError::geometry("corridor references a missing room"));
            }
            if let Some(r) = self.rooms.iter().find(|r| r.bounds.intersects(&c.bounds)) {
                return Err(DungeonError::geometry(format!(
                    "corridor {}-{} cuts through room {}",
                    c.room_a.0,
                    c.room_b.0,
                    r.kind.name()
                )));
            }
        }
        for i in 0..ROOM_COUNT - 1 {
            let (a, b) = (RoomId(i as u8), RoomId(i as u8 + 1));
            if !self
                .corridors
                .iter()
                .any(|c| c.kind == CorridorKind::Chain && c.connects(a, b))
            {
                return Err(DungeonError::geometry(format!("chain is broken between rooms {i} and {}", i + 1)));
            }
        }
        if !self
            .corridors
            .iter()
            .any(|c| c.kind == CorridorKind::Branch && c.room_a.0.abs_diff(c.room_b.0) >= 2)
        {
            return Err(DungeonError::geometry("layout has no branch corridor"));
        }
        if !self
            .corridors
            .iter()
            .any(|c| self.relative_axis(c) == RelativeAxis::Right)
        {
            return Err(DungeonError::geometry("every corridor runs along one axis"));
        }
        Ok(())
    }
}

/// Builds the layout for `(theme, seed)`. The same inputs always give the same layout.
pub fn generate_layout(
    catalog: &DungeonCatalog,
    theme: ThemeId,
    seed: u64,
) -> Result<DungeonLayout, DungeonError> {
    let params = effective_params(theme, &catalog.theme(theme)?.layout);
    let mut rng = layout_rng(theme, seed);

    let cells = match (0..WALK_ATTEMPTS).find_map(|_| walk_cells(&mut rng)) {
        Some(cells) => cells,
        None => {
            log::debug!("{theme} seed {seed}: no looping walk found, using serpentine");
            serpentine_cells(&mut rng)
        }
    };

    let rooms = place_rooms(&cells, &params, &mut rng)?;

    let mut corridors = Vec::with_capacity(ROOM_COUNT + 1);
    for pair in rooms.windows(2) {
        corridors.push(connect(&pair[0], &pair[1], params.corridor_width, CorridorKind::Chain)?);
    }

    let mut candidates = loop_candidates(&cells);
    let preferred: Vec<(usize, usize)> = candidates
        .iter()
        .copied()
        .filter(|&(a, b)| b == RoomKind::Treasure.index() && rooms[a].kind.is_fight())
        .collect();
    let pick_from = if preferred.is_empty() { &candidates } else { &preferred };
    let (a, b) = pick_from[rng.random_range(0..pick_from.len())];
    corridors.push(connect(&rooms[a], &rooms[b], params.corridor_width, CorridorKind::Branch)?);
    candidates.retain(|&p| p != (a, b));
    if !candidates.is_empty() && rng.random::<f32>() < params.extra_branch_chance {
        let (a, b) = candidates[rng.random_range(0..candidates.len())];
        corridors.push(connect(&rooms[a], &rooms[b], params.corridor_width, CorridorKind::Branch)?);
    }

    let layout = DungeonLayout {
        theme,
        seed,
        rooms,
        corridors,
    };
    layout.validate()?;
    log::debug!(
        "{theme} seed {seed}: {} rooms, {} corridors, footprint {:?}",
        layout.rooms.len(),
        layout.corridors.len(),
        layout.footprint()
    );
    Ok(layout)
}

/// Raises or shrinks theme values that could not produce a valid layout.
fn effective_params(theme: ThemeId, p: &LayoutParams) -> LayoutParams {
    let mut p = p.clone();
    if p.corridor_width < MIN_CORRIDOR_WIDTH {
        log::warn!(
            "theme {theme}: corridor_width {} raised to {MIN_CORRIDOR_WIDTH}",
            p.corridor_width
        );
        p.corridor_width = MIN_CORRIDOR_WIDTH;
    }
    // Facing rooms must share enough perpendicular extent to hold a corridor.
    let max_jitter = ((p.room_min - 1 - p.corridor_width) / 2).max(0);
    if p.jitter > max_jitter {
        log::debug!("theme {theme}: jitter {} reduced to {max_jitter}", p.jitter);
        p.jitter = max_jitter;
    }
    if p.room_min - 1 < p.corridor_width {
        log::warn!(
            "theme {theme}: room_min {} raised to fit a {}-wide corridor",
            p.room_min,
            p.corridor_width
        );
        p.room_min = p.corridor_width + 1;
        p.room_max = p.room_max.max(p.room_min);
        p.boss_room_min = p.boss_room_min.max(p.room_min);
        p.boss_room_max = p.boss_room_max.max(p.boss_room_min);
    }
    let min_pitch = p.room_max.max(p.boss_room_max) + 2 * p.jitter + 2 + MIN_CORRIDOR_RUN;
    if p.cell_pitch < min_pitch {
        log::warn!("theme {theme}: cell_pitch {} raised to {min_pitch}", p.cell_pitch);
        p.cell_pitch = min_pitch;
    }
    p
}

const STEPS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Self-avoiding walk of one cell per room. `None` when it gets stuck or has no loop.
fn walk_cells(rng: &mut DungeonRng) -> Option<Vec<(i32, i32)>> {
    let mut cells = vec![(0, 0)];
    while cells.len() < ROOM_COUNT {
        let (x, z) = *cells.last()?;
        let open: Vec<(i32, i32)> = STEPS
            .iter()
            .map(|(dx, dz)| (x + dx, z + dz))
            .filter(|c| !cells.contains(c))
            .collect();
        if open.is_empty() {
            return None;
        }
        cells.push(open[rng.random_range(0..open.len())]);
    }
    (!loop_candidates(&cells).is_empty()).then_some(cells)
}

/// Two rows of four, optionally mirrored and transposed.
fn serpentine_cells(rng: &mut DungeonRng) -> Vec<(i32, i32)> {
    let mirror = rng.random::<bool>();
    let transpose = rng.random::<bool>();
    (0..ROOM_COUNT as i32)
        .map(|i| {
            let row = i / 4;
            let col = if row == 0 { i } else { 7 - i };
            let col = if mirror { -col } else { col };
            if transpose { (row, col) } else { (col, row) }
        })
        .collect()
}

/// Index pairs `(i, j)`, `j >= i + 2`, whose cells are grid neighbours.
fn loop_candidates(cells: &[(i32, i32)]) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    for (i, a) in cells.iter().enumerate() {
        for (j, b) in cells.iter().enumerate().skip(i + 2) {
            if (a.0 - b.0).abs() + (a.1 - b.1).abs() == 1 {
                out.push((i, j));
            }
        }
    }
    out
}

fn place_rooms(
    cells: &[(i32, i32)],
    p: &LayoutParams,
    rng: &mut DungeonRng,
) -> Result<[Room; ROOM_COUNT], DungeonError> {
    let rooms: Vec<Room> = cells
        .iter()
        .zip(RoomKind::CHAIN)
        .enumerate()
        .map(|(i, (&cell, kind))| {
            let (lo, hi) = match kind {
                RoomKind::Boss => (p.boss_room_min, p.boss_room_max),
                k if k.is_fight() => (p.room_min, p.room_max),
                _ => (p.room_min, (p.room_min + 4).min(p.room_max)),
            };
            let sx = rng.random_range(lo..=hi);
            let sz = rng.random_range(lo..=hi);
            let jx = rng.random_range(-p.jitter..=p.jitter);
            let jz = rng.random_range(-p.jitter..=p.jitter);
            let min = BlockPos::new(
                cell.0 * p.cell_pitch - sx / 2 + jx,
                0,
                cell.1 * p.cell_pitch - sz / 2 + jz,
            );
            Room {
                id: RoomId(i as u8),
                kind,
                cell,
                bounds: BlockBox::from_origin_size(min, sx, p.room_height, sz),
            }
        })
        .collect();
    rooms
        .try_into()
        .map_err(|v: Vec<Room>| DungeonError::geometry(format!("expected {ROOM_COUNT} rooms, got {}", v.len())))
}

/// Sub-range of `[lo, hi)` of length `width`, centred.
fn centered(lo: i32, hi: i32, width: i32) -> Option<i32> {
    (hi - lo >= width).then(|| lo + (hi - lo - width) / 2)
}

fn connect(a: &Room, b: &Room, width: i32, kind: CorridorKind) -> Result<Corridor, DungeonError> {
    let (dx, dz) = (b.cell.0 - a.cell.0, b.cell.1 - a.cell.1);
    if dx.abs() + dz.abs() != 1 {
        return Err(DungeonError::geometry(format!(
            "rooms {} and {} are not grid neighbours",
            a.kind.name(),
            b.kind.name()
        )));
    }
    let axis = if dx != 0 { Axis::X } else { Axis::Z };
    let (lo, hi) = if dx + dz > 0 { (&a.bounds, &b.bounds) } else { (&b.bounds, &a.bounds) };
    let height = lo.size_y().min(hi.size_y());
    let too_narrow = || {
        DungeonError::geometry(format!(
            "rooms {} and {} overlap by less than a {width}-wide corridor",
            a.kind.name(),
            b.kind.name()
        ))
    };
    let bounds = match axis {
        Axis::X => {
            let start = centered(lo.min.z.max(hi.min.z), lo.max.z.min(hi.max.z), width).ok_or_else(too_narrow)?;
            BlockBox::new(
                BlockPos::new(lo.max.x, 0, start),
                BlockPos::new(hi.min.x, height, start + width),
            )
        }
        Axis::Z => {
            let start = centered(lo.min.x.max(hi.min.x), lo.max.x.min(hi.max.x), width).ok_or_else(too_narrow)?;
            BlockBox::new(
                BlockPos::new(start, 0, lo.max.z),
                BlockPos::new(start + width, height, hi.min.z),
            )
        }
    };
    let run = match axis {
        Axis::X => bounds.size_x(),
        Axis::Z => bounds.size_z(),
    };
    if run < 2 + MIN_CORRIDOR_RUN {
        return Err(DungeonError::geometry(format!(
            "rooms {} and {} leave no room for a corridor",
            a.kind.name(),
            b.kind.name()
        )));
    }
    Ok(Corridor {
        room_a: a.id,
        room_b: b.id,
        axis,
        width,
        kind,
        bounds,
    })
}
