use std::io::{Read, Seek, Write};
use std::sync::Arc;

use super::{AccessSize, BankDispatcher, LcdController, RamBank};
use crate::error::Result;
use crate::screen::{Hal, Screen, ScreenUpdateInfo};
use crate::session::SessionFile;

pub const RAM_BASE: u32 = 0x0000_0000;
pub const LCD_REGS_BASE: u32 = 0xFFFF_FA00;

/// RAM plus the LCD controller behind one address decoder.
pub struct Device {
    banks: BankDispatcher,
    screen: Arc<Screen>,
}

impl Device {
    pub fn new(ram_size: usize, screen: Arc<Screen>) -> Result<Self> {
        let mut banks = BankDispatcher::new();
        banks.register(Box::new(RamBank::new(RAM_BASE, ram_size, screen.clone())))?;
        banks.register(Box::new(LcdController::new(LCD_REGS_BASE)))?;
        screen.initialize();
        Ok(Self { banks, screen })
    }

    pub fn screen(&self) -> &Arc<Screen> {
        &self.screen
    }

    pub fn banks(&self) -> &BankDispatcher {
        &self.banks
    }

    pub fn banks_mut(&mut self) -> &mut BankDispatcher {
        &mut self.banks
    }

    pub fn lcd(&self) -> Option<&LcdController> {
        self.banks.bank::<LcdController>()
    }

    pub fn lcd_mut(&mut self) -> Option<&mut LcdController> {
        self.banks.bank_mut::<LcdController>()
    }

    pub fn ram(&self) -> Option<&RamBank> {
        self.banks.bank::<RamBank>()
    }

    pub fn read(&mut self, addr: u32, size: AccessSize) -> Result<u32> {
        self.banks.read(addr, size)
    }

    pub fn write(&mut self, addr: u32, size: AccessSize, value: u32) -> Result<()> {
        self.banks.write(addr, size, value)
    }

    pub fn reset(&mut self) {
        self.banks.reset_all();
        self.screen.reset();
    }

    pub fn save<S: Read + Write + Seek>(&self, session: &mut SessionFile<S>) -> Result<()> {
        self.banks.save(session)
    }

    pub fn load<S: Read + Write + Seek>(&mut self, session: &mut SessionFile<S>) -> Result<bool> {
        let complete = self.banks.load(session)?;
        self.screen.load(&*self);
        Ok(complete)
    }
}

impl Hal for Device {
    fn lcd_screen_on(&self) -> bool {
        self.lcd().is_some_and(LcdController::screen_on)
    }

    fn lcd_backlight_on(&self) -> bool {
        self.lcd().is_some_and(LcdController::backlight_on)
    }

    fn led_state(&self) -> u16 {
        self.lcd().map_or(0, LcdController::led_state)
    }

    fn lcd_has_frame(&self) -> bool {
        self.lcd().is_some_and(LcdController::has_frame)
    }

    fn vibrate_on(&self) -> bool {
        self.lcd().is_some_and(LcdController::vibrate_on)
    }

    fn lcd_begin_end(&self) -> (u32, u32) {
        self.lcd().map_or((0, 0), LcdController::frame_range)
    }

    fn lcd_scanlines(&mut self, info: &mut ScreenUpdateInfo) {
        if let (Some(lcd), Some(ram)) = (self.lcd(), self.ram()) {
            lcd.scanlines(ram, info);
        }
    }
}
