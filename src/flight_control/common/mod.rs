pub(crate) mod math;
#[cfg(test)]
mod tests;
