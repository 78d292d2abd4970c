use arboard::Clipboard;
use bigsprite::config::Config;
use bigsprite::{ActorId, ActorKind, Direction, Grid, MapView, Occupant, Outcome, ShapeSpec, Tile, World};
use macroquad::prelude::*;
use tracing::{info, warn, Level};

/// Frames between two NPC path steps
const NPC_STEP_FRAMES: u32 = 12;

/// Visualization state
struct VisState {
    world: World<Grid>,
    player: ActorId,
    goal: Option<Tile>,
    cell_size: f32,
    background: Color,
    action_log_path: String,
    frame: u32,
    status: String,
}

impl VisState {
    fn new(config: &Config) -> bigsprite::Result<Self> {
        let mut world = config.build_world()?;
        let found = world.actors().find(|a| a.is_player()).map(|a| a.id);
        let player = match found {
            Some(id) => id,
            None => {
                let center = Tile::new(world.map().width() / 2, world.map().height() / 2);
                world.spawn(ActorKind::Player, center, Direction::Down, ShapeSpec::default())?
            }
        };

        Ok(VisState {
            world,
            player,
            goal: None,
            cell_size: config.visual.cell_size,
            background: Color::from_rgba(
                config.visual.background_r,
                config.visual.background_g,
                config.visual.background_b,
                255,
            ),
            action_log_path: config.logging.action_log_path.clone(),
            frame: 0,
            status: String::new(),
        })
    }

    fn report(&mut self, what: &str, outcome: bigsprite::Result<Outcome>) {
        self.status = match outcome {
            Ok(Outcome::Committed) => format!("{}: ok", what),
            Ok(Outcome::Rejected(rejection)) => format!("{}: {}", what, rejection),
            Err(e) => format!("{}: {}", what, e),
        };
    }

    fn handle_keys(&mut self) {
        let player = self.player;
        let arrows = [
            (KeyCode::Down, Direction::Down),
            (KeyCode::Left, Direction::Left),
            (KeyCode::Right, Direction::Right),
            (KeyCode::Up, Direction::Up),
        ];
        let held: Vec<Direction> = arrows.iter().filter(|(k, _)| is_key_down(*k)).map(|(_, d)| *d).collect();
        let pressed = arrows.iter().find(|(k, _)| is_key_pressed(*k)).map(|(_, d)| *d);

        if let Some(direction) = pressed {
            let horizontal = held.iter().copied().find(|d| d.is_horizontal());
            let vertical = held.iter().copied().find(|d| !d.is_horizontal());
            match (horizontal, vertical) {
                (Some(h), Some(v)) => {
                    let outcome = self.world.attempt_diagonal(player, h, v);
                    self.report("diagonal", outcome);
                }
                _ => {
                    let outcome = self.world.attempt_move(player, direction);
                    self.report("move", outcome);
                }
            }
        }

        let facing = self.world.actor(player).map(|a| a.facing()).unwrap_or(Direction::Down);
        if is_key_pressed(KeyCode::Q) {
            let outcome = self.world.attempt_turn(player, facing.counter_clockwise());
            self.report("turn", outcome);
        }
        if is_key_pressed(KeyCode::E) {
            let outcome = self.world.attempt_turn(player, facing.clockwise());
            self.report("turn", outcome);
        }
        if is_key_pressed(KeyCode::J) {
            let outcome = self.world.attempt_jump(player, facing.dx() * 2, facing.dy() * 2);
            self.report("jump", outcome);
        }
        if is_key_pressed(KeyCode::Space) {
            match self.world.touch_front(player, facing) {
                Ok(touched) if touched.is_empty() => self.status = "nothing ahead".to_string(),
                Ok(touched) => {
                    let names: Vec<String> = touched.iter().map(|id| id.to_string()).collect();
                    self.status = format!("touching {}", names.join(", "));
                }
                Err(e) => self.status = e.to_string(),
            }
        }
        if is_key_pressed(KeyCode::C) {
            self.copy_to_clipboard();
        }
        if is_key_pressed(KeyCode::V) {
            self.paste_from_clipboard();
        }
        if is_key_pressed(KeyCode::L) {
            if let Some(log) = self.world.action_log() {
                log.print();
                println!("{}", log.summary());
            }
        }
        if is_key_pressed(KeyCode::S) {
            if let Some(log) = self.world.action_log() {
                match log.save_to_file(&self.action_log_path) {
                    Ok(()) => info!("Action log saved to {}", self.action_log_path),
                    Err(e) => warn!("Failed to save action log: {}", e),
                }
            }
        }
    }

    fn handle_click(&mut self, mouse_x: f32, mouse_y: f32) {
        let grid_x = (mouse_x / self.cell_size) as i32;
        let grid_y = (mouse_y / self.cell_size) as i32;
        if !self.world.map().is_valid(grid_x, grid_y) {
            return;
        }

        // Left click: toggle obstacle
        if is_mouse_button_pressed(MouseButton::Left) {
            self.world.toggle_cell(grid_x, grid_y);
        }
        // Right click: goal for the NPCs
        else if is_mouse_button_pressed(MouseButton::Right) {
            self.goal = Some(Tile::new(grid_x, grid_y));
            self.status = format!("goal set to ({},{})", grid_x, grid_y);
        }
    }

    /// Walk every event one step toward the goal
    fn step_npcs(&mut self) {
        self.frame += 1;
        let Some(goal) = self.goal else {
            return;
        };
        if self.frame % NPC_STEP_FRAMES != 0 {
            return;
        }
        let npcs: Vec<ActorId> = self
            .world
            .actors()
            .filter(|a| matches!(a.kind, ActorKind::Event { .. }))
            .map(|a| a.id)
            .collect();
        for id in npcs {
            if let Err(e) = self.world.attempt_step_toward(id, goal) {
                warn!("{} can't path: {}", id, e);
            }
        }
    }

    fn copy_to_clipboard(&self) {
        let layout = self.world.map().to_layout();
        match Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(e) = clipboard.set_text(&layout) {
                    warn!("Failed to copy to clipboard: {}", e);
                } else {
                    info!("Map layout copied to clipboard!");
                    // Keep clipboard alive for a moment to ensure clipboard managers can capture it
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
            Err(e) => warn!("Failed to access clipboard: {}", e),
        }
    }

    fn paste_from_clipboard(&mut self) {
        let text = match Clipboard::new().and_then(|mut c| c.get_text()) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to read clipboard: {}", e);
                return;
            }
        };
        let grid = Grid::from_layout(&text);
        if grid.width == 0 || grid.height == 0 {
            warn!("Clipboard doesn't hold a map layout");
            return;
        }
        let loops = (self.world.map().loop_horizontal, self.world.map().loop_vertical);
        info!("Pasted {}x{} map", grid.width, grid.height);
        *self.world.map_mut() = grid.with_loops(loops.0, loops.1);
    }

    fn draw(&self) {
        clear_background(self.background);
        let map = self.world.map();
        let size = self.cell_size;

        for y in 0..map.height {
            for x in 0..map.width {
                let color = if map.is_blocked(x, y) {
                    RED
                } else {
                    Color::from_rgba(60, 60, 60, 255)
                };
                draw_rectangle(x as f32 * size, y as f32 * size, size - 1.0, size - 1.0, color);
            }
        }

        for actor in self.world.actors() {
            let color = match actor.kind {
                ActorKind::Player => Color::from_rgba(80, 140, 255, 200),
                ActorKind::Event { .. } => Color::from_rgba(255, 170, 60, 200),
                ActorKind::Vehicle { .. } => Color::from_rgba(180, 90, 220, 200),
            };
            for tile in actor.occupied_tiles() {
                draw_rectangle(tile.x as f32 * size, tile.y as f32 * size, size - 1.0, size - 1.0, color);
            }

            // Anchor and facing
            let cx = (actor.position().x as f32 + 0.5) * size;
            let cy = (actor.position().y as f32 + 0.5) * size;
            let facing = actor.facing();
            draw_circle(cx, cy, size * 0.2, WHITE);
            draw_line(
                cx,
                cy,
                cx + facing.dx() as f32 * size * 0.5,
                cy + facing.dy() as f32 * size * 0.5,
                2.0,
                WHITE,
            );
        }

        if let Some(goal) = self.goal {
            draw_rectangle_lines(goal.x as f32 * size, goal.y as f32 * size, size, size, 3.0, GREEN);
        }

        let player = self.world.actor(self.player);
        let position = player.map(|p| p.position().to_string()).unwrap_or_default();
        let info = format!(
            "Player: {}  {}\nArrows: move (two at once: diagonal)  Q/E: turn  J: jump  Space: touch\nLeft click: toggle wall  Right click: NPC goal\nC/V: copy/paste layout  L: print log  S: save log  Esc: close",
            position, self.status
        );
        let bottom = map.height as f32 * size + 20.0;
        for (i, line) in info.lines().enumerate() {
            draw_text(line, 10.0, bottom + i as f32 * 20.0, 20.0, WHITE);
        }
    }
}

fn window_conf() -> Conf {
    let config = Config::load();
    Conf {
        window_title: config.visual.window_title,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let config = Config::load();
    let level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    let mut state = match VisState::new(&config) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Failed to set up the map: {}", e);
            return;
        }
    };

    loop {
        // Handle input
        if is_mouse_button_pressed(MouseButton::Left) || is_mouse_button_pressed(MouseButton::Right) {
            let (mouse_x, mouse_y) = mouse_position();
            state.handle_click(mouse_x, mouse_y);
        }
        state.handle_keys();
        state.step_npcs();

        // Close window on Escape
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        state.draw();

        next_frame().await
    }
}
