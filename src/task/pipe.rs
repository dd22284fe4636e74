//! Left-to-right composition.

/// Thread a value through a list of functions, left to right.
///
/// `pipe!(x, f, g, h)` is `h(g(f(x)))`.
///
/// ```
/// use kodegen_task::{Task, map, pipe, resolved};
///
/// let task: Task<i32, String> = pipe!(
///     resolved(1),
///     map(|n: i32| n + 1),
///     map(|n: i32| n * 10),
/// );
/// ```
#[macro_export]
macro_rules! pipe {
    ($value:expr $(,)?) => {
        $value
    };
    ($value:expr, $($f:expr),+ $(,)?) => {{
        let value = $value;
        $(
            let value = ($f)(value);
        )+
        value
    }};
}

/// Method form of [`pipe!`] for a single step.
pub trait Pipe: Sized {
    fn pipe<R, F>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}
