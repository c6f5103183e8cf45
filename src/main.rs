//! Armory - headless weapon arena
//!
//! Loads the settings and a weapon catalog, builds a rapier arena with a few
//! targets and walks one scripted owner through every weapon in the catalog.

mod settings;

use std::rc::Rc;

use anyhow::{Context, Result};
use armory_core::{EntityId, Quat, Transform, Vec3};
use armory_physics::{report_targets, ArenaWorld, PhysicsConfig, ProjectileTemplate};
use armory_weapons::{
    Simulation, VisualNode, WeaponCatalog, WeaponEvent, WeaponEventKind, WeaponEventListener,
    WeaponHolder, WeaponSlot,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use settings::ArmorySettings;

const BUILTIN_CATALOG: &str = include_str!("../assets/weapons.toml");

/// Frames the trigger stays down, then up, so single-shot weapons re-trigger
const TRIGGER_PULSE: usize = 10;

/// Upper bound on frames spent waiting for live grenades after the script
const DRAIN_FRAMES: usize = 600;

/// Writes combat events to the log
struct CombatLog;

impl WeaponEventListener for CombatLog {
    fn on_weapon_event(&self, event: &WeaponEvent) {
        let id = event.weapon.id();
        match event.kind {
            WeaponEventKind::Hit | WeaponEventKind::MeleeHit => {
                info!("{} hit {:?} at {:?}", id, event.target, event.hit_point)
            }
            WeaponEventKind::ThrowableExplode => {
                info!("{} exploded at {:?}", id, event.hit_point)
            }
            WeaponEventKind::Equip
            | WeaponEventKind::Unequip
            | WeaponEventKind::ReloadStart
            | WeaponEventKind::ReloadEnd
            | WeaponEventKind::EmptyTrigger => {
                info!("{:?}: {} (level {})", event.kind, id, event.weapon.level)
            }
            _ => debug!("{:?}: {} from {:?}", event.kind, id, event.origin),
        }
    }
}

fn load_catalog(settings: &ArmorySettings) -> Result<WeaponCatalog> {
    match &settings.run.catalog_path {
        Some(path) => WeaponCatalog::load(path)
            .with_context(|| format!("Failed to load weapon catalog {}", path.display())),
        None => WeaponCatalog::from_toml_str(BUILTIN_CATALOG)
            .context("Built-in weapon catalog is invalid"),
    }
}

fn build_arena(timestep: f32) -> ArenaWorld {
    let mut world = ArenaWorld::with_config(PhysicsConfig {
        timestep,
        ..Default::default()
    });
    world.create_ground(0.0);
    world.create_static_box(Vec3::new(6.0, 3.0, 0.5), Vec3::new(0.0, 3.0, -25.0));

    world.register_template(
        "rocket",
        ProjectileTemplate {
            radius: 0.15,
            gravity_scale: 0.0,
            restitution: 0.0,
        },
    );
    world.register_template("grenade", ProjectileTemplate::default());

    // One target in knife reach, the rest spread down range
    world.add_target(Vec3::new(0.3, 1.0, -1.4), 0.4, 150.0);
    for (x, z) in [(-3.0, -10.0), (0.0, -12.0), (3.0, -10.0), (1.5, -18.0)] {
        world.add_target(Vec3::new(x, 1.2, z), 0.5, 150.0);
    }
    world
}

/// Weapon model held at the right hand with a muzzle half a unit forward
fn weapon_visual(id: &str) -> VisualNode {
    VisualNode::new(id, Vec3::new(0.3, 1.4, -0.2))
        .with_child(VisualNode::new("Muzzle", Vec3::new(0.0, 0.0, -0.5)))
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    info!("Starting Armory arena...");

    let settings = ArmorySettings::load();
    if !ArmorySettings::exists() {
        if let Err(e) = settings.save() {
            warn!("Failed to write default settings: {}", e);
        }
    }

    let catalog = load_catalog(&settings)?;
    if catalog.is_empty() {
        anyhow::bail!("Weapon catalog has no weapons");
    }
    info!("Catalog holds {} weapons", catalog.len());

    let dt = settings.time.fixed_timestep;
    let mut world = build_arena(dt * settings.time.time_scale);
    let mut sim = Simulation::new(
        settings.time.clone(),
        settings.tracer.clone(),
        settings.run.seed,
    );

    let slots: Vec<WeaponSlot> = catalog
        .iter()
        .map(|config| {
            WeaponSlot::new(config.clone())
                .with_visual(weapon_visual(&config.id))
                .with_start_level(settings.run.start_level)
        })
        .collect();
    let listeners = vec![
        Rc::new(CombatLog) as Rc<dyn WeaponEventListener>,
        sim.tracer_listener(),
    ];
    let owner = sim.add_holder(WeaponHolder::new(EntityId::new(), slots, listeners));

    let frames_per_weapon = (settings.run.seconds_per_weapon / dt).ceil().max(1.0) as usize;
    for index in 0..catalog.len() {
        for frame in 0..frames_per_weapon {
            let Some(holder) = sim.holder_mut(owner) else {
                anyhow::bail!("Scripted owner disappeared");
            };
            if holder.current_index() != index {
                holder.equip_index(index);
            }

            // Sweep the aim across the targets
            let t = frame as f32 / frames_per_weapon as f32;
            let yaw = (0.5 - t) * 0.6;
            holder.set_pose(
                Transform::from_position_rotation(Vec3::ZERO, Quat::from_rotation_y(yaw)),
                None,
            );
            holder.set_fire_input(frame % (2 * TRIGGER_PULSE) < TRIGGER_PULSE);

            let empty = holder
                .current()
                .and_then(|weapon| weapon.ammo())
                .is_some_and(|ammo| ammo.current == 0);
            if empty {
                holder.reload();
            }

            sim.step(dt, &mut world);
            world.step();
        }
    }

    if let Some(holder) = sim.holder_mut(owner) {
        holder.set_fire_input(false);
    }
    let mut drained = 0;
    while !sim.fuses().is_empty() && drained < DRAIN_FRAMES {
        sim.step(dt, &mut world);
        world.step();
        drained += 1;
    }

    info!(
        "Arena run finished after {:.2}s ({} frames)",
        sim.now(),
        sim.clock().frame()
    );
    report_targets(&world);
    Ok(())
}
