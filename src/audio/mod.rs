// Module audio - Gestion du backend CPAL et callback temps-réel

pub mod device;
pub mod dsp_utils;
pub mod engine;
pub mod format_conversion;
pub mod parameters;
pub mod status;
pub mod timing;
