pub mod rx_processor;
