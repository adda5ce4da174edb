pub mod letter_row;
pub mod share_popup;
