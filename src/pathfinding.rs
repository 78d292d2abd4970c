use crate::{Direction, MapView, Tile};
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// A node in the pathfinding search
#[derive(Debug, Clone)]
struct PathNode {
    position: Tile,
    parent: Option<usize>,
    /// Steps from the start
    g: i32,
    /// g plus the distance heuristic
    f: i32,
}

impl PathNode {
    fn heuristic(&self) -> i32 {
        self.f - self.g
    }
}

/// First step of a bounded A* search from `start` toward `goal`.
///
/// `start` is the actor's search anchor. `can_pass(tile, direction)` answers
/// whether the body standing with its search anchor on `tile` may step in
/// `direction`. Nodes whose path cost reaches `search_limit` are not
/// expanded. When the goal isn't reached, the node with the smallest
/// heuristic seen so far is used instead; when even that yields no step the
/// direction falls back to the dominant axis toward the goal.
///
/// Returns `None` when the actor already stands on the goal.
pub fn find_direction<M, F>(map: &M, start: Tile, goal: Tile, search_limit: i32, mut can_pass: F) -> Option<Direction>
where
    M: MapView + ?Sized,
    F: FnMut(Tile, Direction) -> bool,
{
    if start == goal {
        return None;
    }

    trace!("[find_direction] START: {} -> {}, limit {}", start, goal, search_limit);

    let mut nodes: Vec<PathNode> = vec![PathNode {
        position: start,
        parent: None,
        g: 0,
        f: map.distance(start, goal),
    }];
    // Open set, kept in insertion order so the earliest node wins f ties
    let mut open: Vec<usize> = vec![0];
    let mut open_index: HashMap<Tile, usize> = HashMap::from([(start, 0)]);
    let mut closed: HashSet<Tile> = HashSet::new();
    let mut best = 0;
    let mut iterations = 0;

    while !open.is_empty() {
        iterations += 1;

        let mut best_open = 0;
        for (i, &node) in open.iter().enumerate() {
            if nodes[node].f < nodes[open[best_open]].f {
                best_open = i;
            }
        }
        let current = open.remove(best_open);
        let position = nodes[current].position;
        let g = nodes[current].g;
        open_index.remove(&position);
        closed.insert(position);

        if position == goal {
            best = current;
            break;
        }
        if g >= search_limit {
            continue;
        }

        for direction in Direction::ALL {
            let next = map.step(position, direction);
            if closed.contains(&next) || !can_pass(position, direction) {
                continue;
            }

            let next_g = g + 1;
            let neighbour = match open_index.get(&next) {
                Some(&existing) if next_g < nodes[existing].g => existing,
                Some(_) => continue,
                None => {
                    nodes.push(PathNode { position: next, parent: None, g: 0, f: 0 });
                    let index = nodes.len() - 1;
                    open.push(index);
                    open_index.insert(next, index);
                    index
                }
            };
            let node = &mut nodes[neighbour];
            node.parent = Some(current);
            node.g = next_g;
            node.f = next_g + map.distance(next, goal);
            if node.heuristic() < nodes[best].heuristic() {
                best = neighbour;
            }
        }
    }

    trace!(
        "[find_direction] {} iterations, {} nodes, best {}",
        iterations,
        nodes.len(),
        nodes[best].position
    );

    // Walk back to the node right after the start
    let mut node = best;
    while let Some(parent) = nodes[node].parent {
        if parent == 0 {
            break;
        }
        node = parent;
    }

    let first = nodes[node].position;
    let dx = map.delta_x(start.x, first.x);
    let dy = map.delta_y(start.y, first.y);
    if dy < 0 {
        return Some(Direction::Down);
    } else if dx > 0 {
        return Some(Direction::Left);
    } else if dx < 0 {
        return Some(Direction::Right);
    } else if dy > 0 {
        return Some(Direction::Up);
    }

    trace!("[find_direction] no step found, heading straight for {}", goal);
    let dx = map.delta_x(start.x, goal.x);
    let dy = map.delta_y(start.y, goal.y);
    Direction::from_delta(-dx, -dy)
}

/// Format a step sequence for display
pub fn format_steps(steps: &[Direction]) -> String {
    if steps.is_empty() {
        return "No steps".to_string();
    }
    steps.iter().map(|d| format!("{:?}", d)).collect::<Vec<_>>().join(" -> ")
}
