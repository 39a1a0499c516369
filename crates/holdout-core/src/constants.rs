//! Simulation constants and tuning parameters.

/// Simulation tick rate (Hz).
pub const TICK_RATE: u32 = 60;

/// Seconds per tick.
pub const DT: f32 = 1.0 / TICK_RATE as f32;

// --- World grid ---

/// Edge length of one grid tile in world units.
pub const TILE_SIZE: f32 = 32.0;

/// Tiles with durability at or above this value never take damage.
pub const INDESTRUCTIBLE_DURABILITY: u8 = 200;

/// Durability assigned to the generated outer wall and jagged borders.
pub const BORDER_DURABILITY: u8 = 255;

/// Durability of procedurally scattered obstacle walls.
pub const DEFAULT_WALL_DURABILITY: u8 = 3;

/// Time-to-live of the debris overlay left by a destroyed wall (ms).
pub const DEBRIS_OVERLAY_TTL_MS: u16 = 1_500;

// --- Procedural generation ---

/// Prime stride applied to the seed on each generation retry.
pub const GENERATION_RETRY_PRIME: u64 = 1_000_003;

/// Upper bound on obstacle blobs placed in one attempt.
pub const MAX_OBSTACLE_BLOBS: u32 = 4_096;

// --- Actors ---

/// Player base move speed (world units per second).
pub const PLAYER_SPEED: f32 = 220.0;

/// Player maximum health.
pub const PLAYER_MAX_HEALTH: f32 = 100.0;

/// Player collision radius (world units).
pub const PLAYER_RADIUS: f32 = 14.0;

/// Invulnerability granted to the player after taking a hit (seconds).
pub const PLAYER_INVULNERABILITY_SECS: f32 = 0.5;

/// Projectile type fired when a `Fire` command names none.
pub const DEFAULT_PLAYER_PROJECTILE: &str = "PlayerBolt";

/// Distance within which the player collects pickups.
pub const PICKUP_COLLECT_RADIUS: f32 = 40.0;

/// Collision radius of dropped pickups.
pub const PICKUP_RADIUS: f32 = 8.0;

// --- Enemy behaviour ---

/// Brutes charge once the target is within this multiple of their attack radius.
pub const BRUTE_CHARGE_RANGE_FACTOR: f32 = 3.0;

/// Speed multiplier applied while a brute charges.
pub const BRUTE_CHARGE_SPEED_FACTOR: f32 = 1.6;

/// Distances below this are treated as "on top of the target".
pub const AI_MIN_DISTANCE: f32 = 0.001;

// --- Spawning ---

/// Default capacity of live enemies.
pub const MAX_ENEMIES: usize = 200;

/// Inner radius of the spawn ring around the player.
pub const SPAWN_RING_MIN: f32 = 320.0;

/// Outer radius of the spawn ring around the player.
pub const SPAWN_RING_MAX: f32 = 560.0;

/// Random retries used by walkable-tile placement before falling back.
pub const RANDOM_TILE_RETRIES: u32 = 24;

/// Radius (tiles) searched for the nearest walkable tile when a spawn lands on a wall.
pub const WALKABLE_SEARCH_RADIUS: i32 = 12;

// --- Waves ---

/// Default intermission between waves (seconds).
pub const INTERMISSION_SECS: f32 = 5.0;

/// Safety valve on continuous-spawn rolls per step.
pub const WAVE_SPAWN_ATTEMPTS_PER_STEP: u32 = 32;

// --- Projectiles ---

/// Default cap on simultaneously active projectiles.
pub const MAX_PROJECTILES: usize = 512;

/// Projectile collision samples: the center plus four radius offsets.
pub const PROJECTILE_SAMPLE_OFFSETS: [(f32, f32); 5] =
    [(0.0, 0.0), (1.0, 0.0), (-1.0, 0.0), (0.0, 1.0), (0.0, -1.0)];

// --- Drops ---

/// Chance that a wall destroyed by the player drops ore.
pub const ORE_DROP_CHANCE: f64 = 0.25;

/// Chance that an ore drop is rare rather than common.
pub const ORE_RARE_CHANCE: f64 = 0.1;

/// Value of a common ore pickup.
pub const ORE_COMMON_VALUE: u32 = 1;

/// Value of a rare ore pickup.
pub const ORE_RARE_VALUE: u32 = 5;
