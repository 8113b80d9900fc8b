//! Links the `no_std` crates into a freestanding binary so that any accidental
//! dependency on `std` fails to build.
#![no_std]
#![no_main]

use ar_core::Homography;
use core::panic::PanicInfo;
use four_point::FourPoint;

#[panic_handler]
fn panic(_info: &PanicInfo) -> ! {
    loop {}
}

#[no_mangle]
pub extern "C" fn _start() -> ! {
    let _solver = FourPoint::new();
    let _identity = Homography::identity();
    loop {}
}
