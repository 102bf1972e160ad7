mod app;
mod bridge;
mod dto;

use app::App;
use leptos::mount_to_body;

fn main() {
    mount_to_body(App);
}
