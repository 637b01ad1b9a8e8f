pub mod acoustic;
