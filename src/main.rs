#[rocket::launch]
fn rocket() -> _ {
    customer_console::rocket()
}
