pub mod gateway;
pub mod otgul;

#[cfg(test)]
mod tests;
