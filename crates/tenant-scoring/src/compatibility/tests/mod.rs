mod common;

mod debounce;
