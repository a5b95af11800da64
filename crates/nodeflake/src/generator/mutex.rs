use parking_lot::Mutex;

#[cfg(feature = "cache-padded")]
pub(crate) type State<T> = crossbeam_utils::CachePadded<Mutex<T>>;
#[cfg(not(feature = "cache-padded"))]
pub(crate) type State<T> = Mutex<T>;

#[cfg(feature = "cache-padded")]
pub(crate) fn new_state<T>(value: T) -> State<T> {
    crossbeam_utils::CachePadded::new(Mutex::new(value))
}

#[cfg(not(feature = "cache-padded"))]
pub(crate) fn new_state<T>(value: T) -> State<T> {
    Mutex::new(value)
}
