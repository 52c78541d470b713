//! Native stack headroom for the recursive parts of the engine
//!
//! Parsing, evaluation and value printing all recurse on the shape of user
//! input. Each recursive entry point runs through [`guarded`], which moves
//! onto a fresh stack segment when the current one is nearly used up, so
//! the depth limits decide when recursion stops instead of the thread's
//! stack size.

/// Space that must remain before a guarded call runs in place
const RED_ZONE: usize = 256 * 1024;

/// Size of each segment allocated once the red zone is reached
const SEGMENT_SIZE: usize = 4 * 1024 * 1024;

/// Run `f`, switching to a new stack segment first if the current one is low
#[inline]
pub(crate) fn guarded<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth(n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        // Big enough frames that 20k of them cannot fit a default thread stack
        let pad = [n as u8; 512];
        guarded(|| depth(n - 1)) + usize::from(pad[0] == n as u8)
    }

    #[test]
    fn test_guarded_recursion_outgrows_thread_stack() {
        let result = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| depth(20_000))
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(result, 20_000);
    }
}
