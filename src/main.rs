#[rocket::launch]
fn rocket() -> _ {
    let rocket = directory_api::rocket();
    log::info!("starting directory API server");
    rocket
}
