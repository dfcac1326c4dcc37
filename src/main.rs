use arboard::Clipboard;
use astar_visualizer::app::{AppState, BoardStats, Command};
use astar_visualizer::config::Config;
use astar_visualizer::grid::CellState;
use astar_visualizer::layout::{Button, Layout};
use astar_visualizer::pathfinding::SearchOutcome;
use log::{debug, error, info, warn};
use macroquad::prelude::*;

const TURQUOISE: Color = Color::new(64.0 / 255.0, 224.0 / 255.0, 208.0 / 255.0, 1.0);
const BUTTON_TEXT: Color = BLACK;

fn init_logging() {
    // Called from both window_conf and main, so a second init is expected
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

fn window_conf() -> Conf {
    init_logging();
    let config = Config::shared();
    Conf {
        window_title: config.window.title.clone(),
        window_width: config.window.width as i32,
        window_height: config.window.height as i32,
        window_resizable: false,
        ..Default::default()
    }
}

fn cell_color(state: CellState) -> Color {
    match state {
        CellState::Free => WHITE,
        CellState::Barrier => BLACK,
        CellState::Start => ORANGE,
        CellState::End => TURQUOISE,
        CellState::Open => GREEN,
        CellState::Closed => RED,
        CellState::Path => PURPLE,
    }
}

fn button_colors(button: Button) -> (Color, Color) {
    use astar_visualizer::app::Tool;
    match button {
        Button::Tool(Tool::Start) | Button::Run => (Color::from_rgba(0, 200, 0, 255), GREEN),
        Button::Tool(Tool::End) | Button::Reset => (Color::from_rgba(200, 0, 0, 255), RED),
        Button::Tool(Tool::Wall) => (Color::from_rgba(0, 0, 200, 255), BLUE),
        Button::Tool(Tool::Ground) => (WHITE, Color::from_rgba(200, 200, 200, 255)),
    }
}

fn dispatch(app: &mut AppState, command: Command) {
    if let Err(e) = app.handle(command) {
        warn!("{:?} failed: {}", command, e);
    }
}

fn copy_to_clipboard(layout: &str) {
    match Clipboard::new() {
        Ok(mut clipboard) => {
            if let Err(e) = clipboard.set_text(layout) {
                warn!("Failed to copy to clipboard: {}", e);
            } else {
                info!("Grid layout copied to clipboard");
                // Keep clipboard alive for a moment so clipboard managers can capture it
                std::thread::sleep(std::time::Duration::from_millis(100));
            }
        }
        Err(e) => warn!("Failed to access clipboard: {}", e),
    }
}

fn paste_from_clipboard() -> Result<String, String> {
    let mut clipboard = Clipboard::new().map_err(|e| format!("Failed to access clipboard: {}", e))?;
    clipboard
        .get_text()
        .map_err(|e| format!("Failed to read clipboard: {}", e))
}

/// Decode this frame's input into commands. Returns false when the user asked to quit.
fn handle_input(app: &mut AppState, layout: &Layout) -> bool {
    let (mouse_x, mouse_y) = mouse_position();

    if is_mouse_button_pressed(MouseButton::Left) {
        if let Some(button) = layout.button_at(mouse_x, mouse_y) {
            let command = match button {
                Button::Tool(tool) => Command::SelectTool(tool),
                Button::Run => Command::RunSearch,
                Button::Reset => Command::Reset,
            };
            dispatch(app, command);
        }
    }

    // Painting follows the held button so the user can drag walls
    if is_mouse_button_down(MouseButton::Left) {
        if let Some(cell) = layout.cell_at(mouse_x, mouse_y) {
            dispatch(app, Command::Paint(cell));
        }
    } else if is_mouse_button_down(MouseButton::Right) {
        if let Some(cell) = layout.cell_at(mouse_x, mouse_y) {
            dispatch(app, Command::Erase(cell));
        }
    }

    if is_key_pressed(KeyCode::Space) {
        dispatch(app, Command::RunSearch);
    }
    if is_key_pressed(KeyCode::C) {
        dispatch(app, Command::Reset);
    }
    if is_key_pressed(KeyCode::Y) {
        copy_to_clipboard(&app.grid().to_layout());
    }
    if is_key_pressed(KeyCode::P) {
        match paste_from_clipboard() {
            Ok(text) => {
                if let Err(e) = app.load_layout(&text) {
                    warn!("Clipboard does not hold a grid layout: {}", e);
                }
            }
            Err(e) => warn!("{}", e),
        }
    }
    if is_key_pressed(KeyCode::Escape) {
        if app.is_searching() {
            dispatch(app, Command::Cancel);
        } else {
            return false;
        }
    }

    true
}

fn draw_options_panel(app: &AppState, layout: &Layout, stats: &BoardStats) {
    draw_text("Options", 10.0, 40.0, 30.0, WHITE);

    let (mouse_x, mouse_y) = mouse_position();
    for (button, rect) in layout.buttons() {
        let (color, highlight) = button_colors(button);
        let selected = matches!(button, Button::Tool(tool) if app.tool() == Some(tool));
        let hovered = rect.contains(vec2(mouse_x, mouse_y));
        let fill = if selected || hovered { highlight } else { color };
        draw_rectangle(rect.x, rect.y, rect.w, rect.h, fill);
        if selected {
            draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 3.0, YELLOW);
        }

        let label = button.label();
        let dims = measure_text(label, None, 20, 1.0);
        draw_text(
            label,
            rect.x + (rect.w - dims.width) / 2.0,
            rect.y + (rect.h + dims.offset_y) / 2.0,
            20.0,
            BUTTON_TEXT,
        );
    }

    let status = match (app.search_endpoints(), app.expanded(), app.last_outcome()) {
        (Some((start, end)), Some(expanded), _) => {
            format!("{} -> {}: {} expanded", start, end, expanded)
        }
        (_, _, Some(SearchOutcome::Found(path))) => format!("Path: {} cells", path.len()),
        (_, _, Some(SearchOutcome::NotFound)) => "No path".to_string(),
        (_, _, Some(SearchOutcome::Cancelled)) => "Cancelled".to_string(),
        _ => String::new(),
    };
    draw_text(&status, 10.0, 300.0, 20.0, WHITE);

    let counts = [
        ("Walls", stats.barriers),
        ("Open", stats.open),
        ("Closed", stats.closed),
        ("Path", stats.path),
    ];
    for (i, (label, count)) in counts.iter().enumerate() {
        draw_text(&format!("{}: {}", label, count), 10.0, 330.0 + 24.0 * i as f32, 20.0, WHITE);
    }
}

fn draw_grid(app: &AppState, layout: &Layout) {
    for cell in app.grid().cells() {
        let rect = layout.cell_rect(cell.coord());
        draw_rectangle(rect.x, rect.y, rect.w, rect.h, cell_color(cell.state));
    }

    let (origin_x, origin_y) = layout.grid_origin();
    let extent = layout.grid_extent();
    for i in 0..=layout.grid_size {
        let offset = i as f32 * layout.cell_side;
        draw_line(origin_x, origin_y + offset, origin_x + extent, origin_y + offset, 1.0, GRAY);
        draw_line(origin_x + offset, origin_y, origin_x + offset, origin_y + extent, 1.0, GRAY);
    }
}

fn save_action_log(app: &AppState, config: &Config) {
    info!("{}", app.action_log().summary());
    if !config.logging.enable_action_log || app.action_log().actions().is_empty() {
        return;
    }
    app.action_log().print();
    match app.action_log().save_to_file(&config.logging.action_log_path) {
        Ok(()) => info!("Action log saved to {}", config.logging.action_log_path),
        Err(e) => error!("Failed to save action log: {}", e),
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    init_logging();
    let config = Config::shared();
    let layout = Layout::new(config);
    let background = Color::from_rgba(
        config.window.background_r,
        config.window.background_g,
        config.window.background_b,
        255,
    );

    let mut app = match AppState::new(config.grid.size) {
        Ok(app) => app,
        Err(e) => {
            error!("Cannot create grid: {}", e);
            return;
        }
    };
    info!("{}x{} grid ready", config.grid.size, config.grid.size);

    let mut stats = BoardStats::default();

    prevent_quit();
    loop {
        if is_quit_requested() || !handle_input(&mut app, &layout) {
            break;
        }

        if let Err(e) = app.tick(config.search.steps_per_frame) {
            error!("Search aborted: {}", e);
            dispatch(&mut app, Command::Cancel);
        }

        if stats.refresh(app.grid()) {
            debug!("Grid revision {}", app.grid().revision());
        }

        clear_background(background);
        draw_options_panel(&app, &layout, &stats);
        draw_grid(&app, &layout);

        next_frame().await
    }

    save_action_log(&app, config);
}
