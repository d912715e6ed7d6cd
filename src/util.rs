//! Small stateless helpers shared across the generator, fleet, and sender.

use rand::Rng;

/// Picks one of `ports` uniformly at random. Panics if `ports` is empty, which the CLI layer
/// guarantees never happens (it always keeps at least the default port).
pub fn random_port(ports: &[u16]) -> u16 {
    if ports.len() == 1 {
        ports[0]
    } else {
        ports[rand::thread_rng().gen_range(0..ports.len())]
    }
}

/// Uniformly random index in `[0, bound)`.
pub fn random_index(bound: usize) -> usize {
    rand::thread_rng().gen_range(0..bound)
}

/// Draws a uniform `[0.0, 1.0)` float, used for the connection-drop coin flip.
pub fn random_unit() -> f64 {
    rand::thread_rng().gen_range(0.0..1.0)
}

/// Random dynafile id in `[0, range)`.
pub fn random_dynafile_id(range: u32) -> u32 {
    rand::thread_rng().gen_range(0..range)
}

/// Random extra-data length in `[1, max]`, used when `-r` is given alongside `-d`.
pub fn random_extra_data_len(max: usize) -> usize {
    rand::thread_rng().gen_range(1..=max)
}
