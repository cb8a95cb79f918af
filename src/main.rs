use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use delve_blocks::BlockPalette;
use delve_dungeon::{DungeonCatalog, ThemeId, generate_layout};
use delve_geom::{BlockBox, BlockPos, Vec3};
use delve_instance::{ChestOutcome, Event, GameContext, Payload};
use delve_world::{ChunkStore, SpatialQuery};

#[derive(Debug, Parser)]
#[command(author, about, version)]
struct Args {
    /// Dungeon catalog (themes, clearances, enemies, portals). Built-in when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Block palette the catalog's names resolve against. Built-in when omitted.
    #[arg(long, global = true)]
    palette: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the rooms and corridors generated for a theme and seed.
    Layout {
        #[arg(long, default_value = "plains")]
        theme: ThemeId,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// List the catalog's portals.
    Portals,
    /// Enter a portal's dungeon, loot it, walk out, and enter again.
    Visit {
        portal: String,
        #[arg(long, default_value_t = 1)]
        reentries: u32,
    },
}

fn load_catalog(args: &Args) -> Result<DungeonCatalog, Box<dyn Error>> {
    let palette = match &args.palette {
        Some(p) => BlockPalette::load_from_path(p)?,
        None => BlockPalette::builtin()?,
    };
    let catalog = match &args.config {
        Some(p) => DungeonCatalog::load_from_path(p, palette)?,
        None => DungeonCatalog::builtin_with_palette(palette)?,
    };
    Ok(catalog)
}

/// A small stone platform the player stands on between visits.
fn hub_store(catalog: &DungeonCatalog) -> Result<(ChunkStore, Vec3), Box<dyn Error>> {
    let mut hub = ChunkStore::new(catalog.world().limits.clone());
    let stone = catalog.block("stone")?;
    hub.fill(&BlockBox::new(BlockPos::new(-16, 0, -16), BlockPos::new(16, 1, 16)), stone)?;
    Ok((hub, Vec3::new(0.5, 1.0, 0.5)))
}

fn print_layout(catalog: &DungeonCatalog, theme: ThemeId, seed: u64) -> Result<(), Box<dyn Error>> {
    let layout = generate_layout(catalog, theme, seed)?;
    println!("{theme} seed {seed} (primary axis {:?})", layout.primary_axis());
    for r in &layout.rooms {
        let b = r.bounds;
        println!(
            "  room {} {:<8} cell ({:>2},{:>2}) x {}..{} z {}..{}",
            r.id.0,
            r.kind.name(),
            r.cell.0,
            r.cell.1,
            b.min.x,
            b.max.x,
            b.min.z,
            b.max.z
        );
    }
    for c in &layout.corridors {
        println!(
            "  corridor {}-{} {:?} {:?} width {} span x {}..{} z {}..{}",
            c.room_a.0,
            c.room_b.0,
            c.kind,
            c.axis,
            c.width,
            c.bounds.min.x,
            c.bounds.max.x,
            c.bounds.min.z,
            c.bounds.max.z
        );
    }
    Ok(())
}

fn visit(ctx: &mut GameContext, portal: &str) -> Result<(), Box<dyn Error>> {
    let inst = ctx.activate_portal(portal)?;
    println!(
        "{} ({} seed {}): {} enemies, {} interactables, spawn ({:.1},{:.1},{:.1})",
        portal,
        inst.theme,
        inst.seed,
        inst.enemies.len(),
        inst.interactables.len(),
        inst.spawn_point.x,
        inst.spawn_point.y,
        inst.spawn_point.z
    );
    for e in &inst.enemies {
        println!(
            "  {:<12} room {} stage {} hp {}{}",
            e.type_id,
            e.room.0,
            e.stage,
            e.max_hp,
            if e.is_boss { " (boss)" } else { "" }
        );
    }
    let (theme, spawn, exit) = (inst.theme, inst.spawn_point.cell(), inst.exit_point);
    let items: Vec<_> = inst
        .interactables
        .iter()
        .map(|i| (i.id, i.payload.clone()))
        .collect();
    let key = ctx.manager.catalog().theme(theme)?.key_item.clone();

    let blocked: Vec<i32> = (2..=6).filter(|dy| !ctx.is_air(spawn.offset(0, *dy, 0))).collect();
    if !blocked.is_empty() {
        return Err(format!("spawn is obstructed at heights {blocked:?}").into());
    }

    for (id, payload) in &items {
        if let Payload::Pickup { .. } = payload {
            ctx.queue.emit_now(Event::Interact { id: *id });
        }
    }
    ctx.step();
    for (id, payload) in &items {
        if let Payload::LockedChest { chest_id } = payload {
            match ctx.use_key_for_locked_chest(*chest_id, &key) {
                ChestOutcome::Unlocked => println!("  unlocked chest {} with {key}", chest_id.0),
                other => println!("  chest {}: {other:?}", chest_id.0),
            }
            println!("  chest {}: {:?}", chest_id.0, ctx.interact(*id));
        }
    }

    ctx.queue.emit_now(Event::PlayerMoved { position: exit });
    ctx.step();
    if ctx.current_instance().is_some() {
        return Err("reaching the exit did not end the visit".into());
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let catalog = load_catalog(&args)?;
    log::debug!(
        "catalog: {} theme(s), {} portal(s)",
        catalog.themes().count(),
        catalog.portals().len()
    );

    match args.command {
        Command::Layout { theme, seed } => print_layout(&catalog, theme, seed)?,
        Command::Portals => {
            for p in catalog.portals() {
                println!("{:<14} {:<7} seed {}", p.id, p.theme, p.seed);
            }
        }
        Command::Visit { portal, reentries } => {
            let (hub, hub_spawn) = hub_store(&catalog)?;
            let mut ctx = GameContext::new(catalog, hub, hub_spawn);
            for _ in 0..=reentries {
                visit(&mut ctx, &portal)?;
            }
            let rec = ctx.manager.portal_record(&portal);
            println!("{portal}: {} visit(s), {} completed", rec.visits, rec.completed);
            for (item, n) in ctx.inventory.iter() {
                println!("  {item} x{n}");
            }
        }
    }
    Ok(())
}
